//! Error types for the postgrab application.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("URL not supported: {url}")]
    UrlNotSupported { url: String },

    // Pipeline errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Extractor '{extractor}' could not parse the page: {message}")]
    Extraction {
        extractor: &'static str,
        message: String,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Interrupted")]
    Cancelled,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Build an extraction error for the named extractor.
    pub fn extraction(extractor: &'static str, message: impl Into<String>) -> Self {
        Error::Extraction {
            extractor,
            message: message.into(),
        }
    }

    /// Whether the error is a user/domain condition rather than an internal failure.
    ///
    /// Domain errors are reported with a terse message; everything else gets full
    /// diagnostic detail in verbose mode.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_)
                | Error::UrlNotSupported { .. }
                | Error::Fetch(_)
                | Error::Extraction { .. }
                | Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::Cancelled
        )
    }

    /// Process exit code for a run that terminated with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) | Error::UrlParse(_) => exit_codes::INVALID_ARGUMENT,
            Error::UrlNotSupported { .. } => exit_codes::URL_NOT_SUPPORTED,
            Error::Fetch(_) => exit_codes::FETCH_ERROR,
            Error::Extraction { .. } => exit_codes::EXTRACTION_ERROR,
            Error::Config(_) | Error::ConfigValidation { .. } | Error::TomlParse(_) => {
                exit_codes::CONFIG_ERROR
            }
            Error::Cancelled => exit_codes::INTERRUPTED,
            _ => exit_codes::UNEXPECTED_ERROR,
        }
    }
}

/// Failure to retrieve the post page itself. Always fatal for the run.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network unreachable while fetching {url}: {message}")]
    NetworkUnreachable { url: String, message: String },

    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Could not decode page body from {url}: {message}")]
    DecodeError { url: String, message: String },
}

impl FetchError {
    /// Classify a transport error raised while fetching `url`.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            FetchError::Timeout { url }
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus {
                url,
                status: status.as_u16(),
            }
        } else if err.is_decode() || err.is_body() {
            FetchError::DecodeError {
                url,
                message: err.to_string(),
            }
        } else {
            FetchError::NetworkUnreachable {
                url,
                message: err.to_string(),
            }
        }
    }
}

/// Per-asset download failure. Contained in the run report, never fatal to the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Permanent failure: {message}")]
    Permanent {
        status: Option<u16>,
        message: String,
    },

    #[error("IO failure: {0}")]
    Io(String),

    #[error("Could not resolve media URL: {0}")]
    Unresolved(String),

    #[error("Cancelled")]
    Cancelled,
}

impl DownloadError {
    /// Permanent failure caused by an HTTP status.
    pub fn status(status: u16) -> Self {
        DownloadError::Permanent {
            status: Some(status),
            message: format!("HTTP {}", status),
        }
    }

    /// Classify a transport error raised while downloading an asset.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        match err.status() {
            Some(status) if is_transient_status(status.as_u16()) => {
                DownloadError::Transient(format!("HTTP {}", status.as_u16()))
            }
            Some(status) => DownloadError::status(status.as_u16()),
            None if err.is_builder() => DownloadError::Permanent {
                status: None,
                message: err.to_string(),
            },
            // Timeouts, refused or reset connections, truncated bodies.
            None => DownloadError::Transient(err.to_string()),
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DownloadError::Transient(_))
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        DownloadError::Io(err.to_string())
    }
}

/// HTTP statuses worth retrying: server errors, request timeout, rate limiting.
pub fn is_transient_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const INVALID_ARGUMENT: i32 = 2;
    pub const URL_NOT_SUPPORTED: i32 = 3;
    pub const FETCH_ERROR: i32 = 4;
    pub const EXTRACTION_ERROR: i32 = 5;
    pub const CONFIG_ERROR: i32 = 6;
    pub const UNEXPECTED_ERROR: i32 = 100;
    /// Interrupted before any download started (128 + SIGINT).
    pub const INTERRUPTED: i32 = 130;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(500));
        assert!(is_transient_status(503));
        assert!(is_transient_status(429));
        assert!(is_transient_status(408));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(403));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            Error::InvalidArgument("x".into()).exit_code(),
            exit_codes::INVALID_ARGUMENT
        );
        assert_eq!(
            Error::UrlNotSupported {
                url: "https://unsupported.example/x".into()
            }
            .exit_code(),
            exit_codes::URL_NOT_SUPPORTED
        );
        assert_eq!(
            Error::Fetch(FetchError::HttpStatus {
                url: "https://example.com".into(),
                status: 404
            })
            .exit_code(),
            exit_codes::FETCH_ERROR
        );
        assert_eq!(
            Error::extraction("imgur", "no data").exit_code(),
            exit_codes::EXTRACTION_ERROR
        );
    }

    #[test]
    fn test_url_not_supported_names_url() {
        let err = Error::UrlNotSupported {
            url: "https://unsupported.example/x".into(),
        };
        assert!(err.to_string().contains("https://unsupported.example/x"));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_cancelled_exit_code() {
        assert_eq!(Error::Cancelled.exit_code(), exit_codes::INTERRUPTED);
        assert!(Error::Cancelled.is_user_error());
    }

    #[test]
    fn test_io_is_internal() {
        let err = Error::Io(std::io::Error::other("disk"));
        assert!(!err.is_user_error());
        assert_eq!(err.exit_code(), exit_codes::UNEXPECTED_ERROR);
    }
}
