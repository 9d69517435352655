//! Unified error types for textweb.
//!
//! Display strings carry a stable code prefix so the CLI (and log lines) can
//! be grepped by failure class.

/// Unified error types for the textweb client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty search term).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid or unsupported URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// DNS, TCP, or TLS failure, or an I/O error on an open connection.
    #[error("CONNECTION_ERROR: {0}")]
    Connection(String),

    /// Connect, handshake, or read exceeded the configured timeout.
    #[error("TIMEOUT: {0}")]
    Timeout(String),

    /// Malformed status line or missing header/body separator.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// Response exceeded the configured byte limit.
    #[error("TOO_LARGE: {0}")]
    TooLarge(String),

    /// Writing the cache file failed. The in-memory cache still holds the entry.
    #[error("CACHE_SAVE_ERROR: {0}")]
    CacheSave(String),
}

impl Error {
    /// Short machine-readable code for this error class.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Connection(_) => "CONNECTION_ERROR",
            Error::Timeout(_) => "TIMEOUT",
            Error::Parse(_) => "PARSE_ERROR",
            Error::TooLarge(_) => "TOO_LARGE",
            Error::CacheSave(_) => "CACHE_SAVE_ERROR",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::TimedOut {
            Error::Timeout(err.to_string())
        } else {
            Error::Connection(err.to_string())
        }
    }
}
