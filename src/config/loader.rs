//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub extractors: ExtractorsConfig,
}

/// Download engine options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Destination directory. Defaults to the current working directory.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Number of assets downloaded concurrently.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Attempts per asset, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry, doubled on each further retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Abort an attempt when no response or body bytes arrive for this long.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Whether to render progress bars.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            max_parallel: default_max_parallel(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            read_timeout_secs: default_read_timeout(),
            show_progress: true,
        }
    }
}

/// HTTP transport options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Browser user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for fetching the post page.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Timeout for establishing a connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            fetch_timeout_secs: default_fetch_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_redirects: default_max_redirects(),
        }
    }
}

/// Extractor registration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorsConfig {
    /// Hosts whose pages are read through their OpenGraph meta tags.
    #[serde(default = "default_opengraph_hosts")]
    pub opengraph_hosts: Vec<String>,
}

impl Default for ExtractorsConfig {
    fn default() -> Self {
        Self {
            opengraph_hosts: default_opengraph_hosts(),
        }
    }
}

fn default_max_parallel() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_read_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string()
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    10
}

fn default_opengraph_hosts() -> Vec<String> {
    ["tumblr.com", "flickr.com", "9gag.com", "giphy.com"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!("Configuration file not found: {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load an explicitly requested file, or the default one if it exists.
    ///
    /// A missing default file is not an error; built-in defaults are used instead.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the effective output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.download
            .output_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.http.fetch_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.download.read_timeout_secs)
    }
}

/// Platform configuration path, e.g. `~/.config/postgrab/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "postgrab").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.download.max_parallel, 4);
        assert_eq!(config.download.max_attempts, 3);
        assert_eq!(config.http.max_redirects, 10);
        assert!(config
            .extractors
            .opengraph_hosts
            .contains(&"tumblr.com".to_string()));
    }

    #[test]
    fn test_partial_section() {
        let config: Config = toml::from_str(
            r#"
            [download]
            max_parallel = 8
            output_dir = "/tmp/media"

            [extractors]
            opengraph_hosts = ["example.org"]
            "#,
        )
        .unwrap();
        assert_eq!(config.download.max_parallel, 8);
        assert_eq!(config.download.max_attempts, 3);
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/media"));
        assert_eq!(config.extractors.opengraph_hosts, vec!["example.org"]);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_or_default(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.download.max_parallel = 2;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.download.max_parallel, 2);
    }
}
