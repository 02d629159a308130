use crate::state::UrlStatus;
use crate::FrontierError;
use chrono::{DateTime, Duration, Utc};
use url::Url;

/// Per-URL visit metadata, one record per canonical URL
#[derive(Debug, Clone, PartialEq)]
pub struct UrlRecord {
    /// The canonical URL; this is the store key
    pub url: Url,

    /// Number of successful fetches
    pub visit_count: u32,

    /// Time of the most recent successful fetch, `None` if never visited
    pub last: Option<DateTime<Utc>>,

    /// Number of failed fetches; never reset
    pub error_count: u32,

    /// Lifecycle status
    pub status: UrlStatus,

    /// Last score the policy assigned to this URL
    pub score: i64,
}

impl UrlRecord {
    /// Creates a fresh, never-visited pending record
    pub fn new(url: Url) -> Self {
        Self {
            url,
            visit_count: 0,
            last: None,
            error_count: 0,
            status: UrlStatus::Pending,
            score: 0,
        }
    }

    /// Earliest time this URL may be fetched again
    ///
    /// Returns `None` if the URL has never been visited, in which case there is
    /// no floor.
    pub fn revisit_floor(
        &self,
        min_delay: Duration,
    ) -> Result<Option<DateTime<Utc>>, FrontierError> {
        self.last.map(|last| checked_offset(last, min_delay)).transpose()
    }
}

/// Returns `at + delay`, failing instead of overflowing
pub fn checked_offset(
    at: DateTime<Utc>,
    delay: Duration,
) -> Result<DateTime<Utc>, FrontierError> {
    at.checked_add_signed(delay).ok_or_else(|| {
        FrontierError::TimeOutOfRange(format!("{} + {}ms", at, delay.num_milliseconds()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_record() {
        let record = UrlRecord::new(Url::parse("https://example.com/").unwrap());
        assert_eq!(record.visit_count, 0);
        assert_eq!(record.error_count, 0);
        assert_eq!(record.status, UrlStatus::Pending);
        assert!(record.last.is_none());
    }

    #[test]
    fn test_revisit_floor() {
        let mut record = UrlRecord::new(Url::parse("https://example.com/").unwrap());
        assert_eq!(record.revisit_floor(Duration::seconds(10)).unwrap(), None);

        let last = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        record.last = Some(last);
        assert_eq!(
            record.revisit_floor(Duration::seconds(10)).unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 10).unwrap())
        );
    }

    #[test]
    fn test_revisit_floor_out_of_range() {
        let mut record = UrlRecord::new(Url::parse("https://example.com/").unwrap());
        record.last = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        assert!(matches!(
            record.revisit_floor(Duration::MAX),
            Err(FrontierError::TimeOutOfRange(_))
        ));
    }
}
