use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain http to a non-loopback host.
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    Insecure,
    /// The URL carries a query string or fragment, which cannot be joined onto.
    #[error("Base URL must not contain a query or fragment")]
    NotABase,
}

/// Validates the backend base URL and normalizes it for path joining.
///
/// The `user-id` header travels with every request, so plain `http` is only
/// accepted for loopback hosts (`localhost`, `127.0.0.1`, `::1`), which is
/// what local backends and mock servers use.
///
/// The returned URL always ends in `/` so `Url::join("api/articles")` appends
/// rather than replacing the last path segment.
///
/// # Examples
///
/// ```
/// use newsdeck::util::validate_base_url;
///
/// let url = validate_base_url("https://news.example.com/v1").unwrap();
/// assert_eq!(url.as_str(), "https://news.example.com/v1/");
///
/// assert!(validate_base_url("http://127.0.0.1:8000").is_ok());
/// assert!(validate_base_url("http://news.example.com").is_err());
/// assert!(validate_base_url("ftp://news.example.com").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let mut url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "https" => {}
        "http" => {
            if !is_loopback_host(&url) {
                tracing::error!(base_url = %url, "Rejecting non-HTTPS base URL (HTTPS required except for localhost)");
                return Err(UrlValidationError::Insecure);
            }
            tracing::warn!(base_url = %url, "Using non-HTTPS base URL (localhost only)");
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(UrlValidationError::NotABase);
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Validates an article's source link before it is handed to the user.
///
/// Only `http`/`https` links are returned; anything else (`javascript:`,
/// `file:`, garbage) yields an error so the caller can omit the link.
pub fn validate_source_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

fn is_loopback_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if host == "localhost" {
        return true;
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    host_for_parse
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}
