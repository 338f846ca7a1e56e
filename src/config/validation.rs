//! Configuration and input validation logic.

use url::Url;

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Maximum number of concurrent downloads.
const MAX_PARALLEL: usize = 32;

/// Maximum attempts per asset.
const MAX_ATTEMPTS: u32 = 10;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_parallelism(config.download.max_parallel)?;
    validate_attempts(config.download.max_attempts)?;

    if config.download.base_delay_ms > config.download.max_delay_ms {
        return Err(Error::ConfigValidation {
            field: "base_delay_ms".to_string(),
            message: format!(
                "Base delay ({} ms) exceeds max delay ({} ms)",
                config.download.base_delay_ms, config.download.max_delay_ms
            ),
        });
    }

    if config.download.read_timeout_secs == 0 || config.http.fetch_timeout_secs == 0 {
        return Err(Error::ConfigValidation {
            field: "timeout".to_string(),
            message: "Timeouts must be at least one second".to_string(),
        });
    }

    if config.http.user_agent.trim().is_empty() {
        return Err(Error::ConfigValidation {
            field: "user_agent".to_string(),
            message: "User agent cannot be empty".to_string(),
        });
    }

    if config.http.max_redirects == 0 {
        return Err(Error::ConfigValidation {
            field: "max_redirects".to_string(),
            message: "At least one redirect must be allowed".to_string(),
        });
    }

    Ok(())
}

/// Validate the download parallelism bound.
pub fn validate_parallelism(max_parallel: usize) -> Result<()> {
    if max_parallel == 0 || max_parallel > MAX_PARALLEL {
        return Err(Error::ConfigValidation {
            field: "max_parallel".to_string(),
            message: format!(
                "Parallelism must be between 1 and {} (got {})",
                MAX_PARALLEL, max_parallel
            ),
        });
    }
    Ok(())
}

/// Validate the per-asset attempt count.
pub fn validate_attempts(max_attempts: u32) -> Result<()> {
    if max_attempts == 0 || max_attempts > MAX_ATTEMPTS {
        return Err(Error::ConfigValidation {
            field: "max_attempts".to_string(),
            message: format!(
                "Attempts must be between 1 and {} (got {})",
                MAX_ATTEMPTS, max_attempts
            ),
        });
    }
    Ok(())
}

/// Strip shell escape characters from a user-supplied post URL.
///
/// Terminals often insert `\` before `?`, `&` and `=`; those are removed along with
/// surrounding whitespace.
pub fn normalize_post_url(input: &str) -> String {
    input.replace('\\', "").trim().to_string()
}

/// Normalize and parse a post URL.
pub fn parse_post_url(input: &str) -> Result<Url> {
    let normalized = normalize_post_url(input);
    if normalized.is_empty() {
        return Err(Error::InvalidArgument("url was not provided".to_string()));
    }

    let url = Url::parse(&normalized)
        .map_err(|e| Error::InvalidArgument(format!("'{}' is not a valid URL: {}", normalized, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::InvalidArgument(format!(
            "Unsupported URL scheme '{}' in '{}'",
            scheme, normalized
        ))),
    }
}
