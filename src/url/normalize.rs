use crate::url::host::validate_host;
use crate::UrlError;
use url::{Host, ParseError, Url};

/// Normalizes a URL string into its canonical form
///
/// Two inputs that refer to the same resource by convention map to one
/// output, which is used as the identity key for deduplication and revisit
/// tracking.
///
/// # Normalization Steps
///
/// 1. Reject input that is not valid UTF-8 (see [`normalize_bytes`])
/// 2. Lower-case the scheme; only `http` and `https` are accepted
/// 3. Split host and port; an empty host is rejected
/// 4. Validate the host as a domain name, `localhost`, or IP literal,
///    falling back to its IDNA (punycode) form
/// 5. Drop the port if it is the scheme's default
/// 6. Clean the path: resolve `.` and `..`, collapse repeated separators,
///    keep a trailing separator
/// 7. Remove the fragment
///
/// The query string is left untouched.
///
/// # Examples
///
/// ```
/// use sumi_frontier::url::normalize;
///
/// let url = normalize("http://Example.com:80/a/../b#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b");
/// ```
pub fn normalize(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| classify_parse_error(url_str, e))?;
    normalize_in_place(&mut url)?;
    Ok(url)
}

/// Normalizes a URL given as raw bytes, rejecting invalid UTF-8
pub fn normalize_bytes(raw: &[u8]) -> Result<Url, UrlError> {
    let url_str = std::str::from_utf8(raw)
        .map_err(|_| UrlError::InvalidEncoding(String::from_utf8_lossy(raw).into_owned()))?;
    normalize(url_str)
}

/// Normalizes an already parsed URL in place
///
/// This applies steps 2 through 7 of [`normalize`]. An already canonical URL
/// is left unchanged.
pub fn normalize_in_place(url: &mut Url) -> Result<(), UrlError> {
    // Step 2: the parser lower-cases the scheme for us
    let scheme = url.scheme().to_string();
    if scheme != "http" && scheme != "https" {
        return Err(UrlError::UnsupportedScheme(scheme));
    }

    // Step 3 & 4: host
    let canonical_host = match url.host() {
        None => return Err(UrlError::EmptyHost),
        Some(Host::Domain("")) => return Err(UrlError::EmptyHost),
        Some(Host::Domain(domain)) => Some(validate_host(domain)?),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => None,
    };
    if let Some(host) = canonical_host {
        if url.host_str() != Some(host.as_str()) {
            url.set_host(Some(&host))
                .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
        }
    }

    // Step 5: default port
    if url.port().is_some() && url.port() == default_port(&scheme) {
        url.set_port(None)
            .map_err(|_| UrlError::Malformed("Failed to clear default port".to_string()))?;
    }

    // Step 6: path
    let cleaned = clean_path(url.path());
    if cleaned != url.path() {
        url.set_path(&cleaned);
    }

    // Step 7: fragment
    url.set_fragment(None);

    Ok(())
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Maps a parser failure onto the normalizer's error taxonomy
///
/// An unsupported scheme is reported as such even when the rest of the URL
/// would not parse, so `ftp://` is a scheme error rather than a host error.
fn classify_parse_error(url_str: &str, err: ParseError) -> UrlError {
    if let Some((scheme, _)) = url_str.split_once(':') {
        let looks_like_scheme = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        let lower = scheme.to_ascii_lowercase();
        if looks_like_scheme && lower != "http" && lower != "https" {
            return UrlError::UnsupportedScheme(lower);
        }
    }

    match err {
        ParseError::EmptyHost => UrlError::EmptyHost,
        ParseError::IdnaError
        | ParseError::InvalidDomainCharacter
        | ParseError::InvalidIpv4Address
        | ParseError::InvalidIpv6Address
        | ParseError::InvalidPort => UrlError::InvalidHost {
            host: raw_authority(url_str).to_string(),
            reason: err.to_string(),
        },
        _ => UrlError::Parse(format!("{:?}: {}", url_str, err)),
    }
}

/// Returns the authority portion of a URL string that failed to parse
fn raw_authority(url_str: &str) -> &str {
    let rest = url_str
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url_str);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

/// Cleans a URL path textually
///
/// Dot segments are resolved and repeated separators collapsed. A path that
/// cleans to nothing stays empty, and a trailing separator on the input is
/// preserved.
pub(crate) fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            _ => segments.push(segment),
        }
    }

    let mut cleaned = segments.join("/");
    if rooted {
        cleaned.insert(0, '/');
    }
    if path.ends_with('/') && !cleaned.ends_with('/') {
        cleaned.push('/');
    }
    cleaned
}
