//! URL validation for request targets.
//!
//! Cache keys are the caller's exact URL string, so nothing here rewrites the
//! input beyond what `url::Url` parsing implies for the request line.

/// Error type for URL validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for textweb_core::Error {
    fn from(err: UrlError) -> Self {
        textweb_core::Error::InvalidUrl(err.to_string())
    }
}

/// Parse an absolute `http`/`https` URL.
///
/// Leading and trailing whitespace is ignored. Relative references, other
/// schemes, and URLs without a host are rejected.
pub fn parse_url(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(format!("{trimmed}: {e}")))?;
    check_target(&parsed)?;

    Ok(parsed)
}

/// Check that an already-parsed URL can be fetched.
pub fn check_target(url: &url::Url) -> Result<(), UrlError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(UrlError::MissingHost(url.to_string())),
    }
}
