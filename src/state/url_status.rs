/// URL status definitions for tracking crawl progress
///
/// Every canonical URL in the store is in exactly one of these states.
use std::fmt;

/// Represents the lifecycle state of a URL record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UrlStatus {
    /// URL is known and still has work pending (queued, due, or being fetched)
    #[default]
    Pending,

    /// The policy declared the URL done, or the fetch layer reported it done
    Finished,

    /// The URL failed more times than the retry limit allows
    Error,
}

impl UrlStatus {
    /// Returns true if this is a terminal state
    ///
    /// Only `Pending` records ever transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Finished => "finished",
            Self::Error => "error",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "finished" => Some(Self::Finished),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> [Self; 3] {
        [Self::Pending, Self::Finished, Self::Error]
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!UrlStatus::Pending.is_terminal());
        assert!(UrlStatus::Finished.is_terminal());
        assert!(UrlStatus::Error.is_terminal());
    }

    #[test]
    fn test_db_string_roundtrip() {
        for status in UrlStatus::all_statuses() {
            assert_eq!(
                UrlStatus::from_db_string(status.to_db_string()),
                Some(status)
            );
        }
        assert_eq!(UrlStatus::from_db_string("queued"), None);
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(UrlStatus::default(), UrlStatus::Pending);
    }

    #[test]
    fn test_display() {
        assert_eq!(UrlStatus::Finished.to_string(), "finished");
    }
}
