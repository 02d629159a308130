use crate::UrlError;
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;
use url::Host;

/// Dot-separated labels of 1-63 alphanumeric/hyphen characters; the final
/// label may not start or end with a hyphen.
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9-]{1,63}\.)+[a-zA-Z0-9][a-zA-Z0-9-]{0,61}[a-zA-Z0-9]$").unwrap()
});

/// Validates a host and returns its canonical (lowercase, ASCII) form
///
/// A host is accepted if it is a domain name, `localhost`, or a literal IP
/// address. Anything else is retried in its IDNA (punycode) form before being
/// rejected.
///
/// # Examples
///
/// ```
/// use sumi_frontier::url::validate_host;
///
/// assert_eq!(validate_host("Example.COM").unwrap(), "example.com");
/// assert_eq!(validate_host("bücher.example").unwrap(), "xn--bcher-kva.example");
/// assert!(validate_host("not_a_host").is_err());
/// ```
pub fn validate_host(host: &str) -> Result<String, UrlError> {
    let lower = host.to_lowercase();
    if is_domain_name(&lower) || lower == "localhost" || is_ip_literal(&lower) {
        return Ok(lower);
    }

    match Host::parse(host) {
        Ok(Host::Domain(ascii)) if is_domain_name(&ascii) => Ok(ascii),
        Ok(_) => Err(UrlError::InvalidHost {
            host: host.to_string(),
            reason: "not valid domain name or IP address".to_string(),
        }),
        Err(e) => Err(UrlError::InvalidHost {
            host: host.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Returns true if the host matches the domain-name pattern
pub fn is_domain_name(host: &str) -> bool {
    DOMAIN_RE.is_match(host)
}

fn is_ip_literal(host: &str) -> bool {
    let unbracketed = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    unbracketed.parse::<IpAddr>().is_ok()
}
