//! Ordered extractor registry.
//!
//! Registrations are tried in the order they were added and the first matching
//! pattern wins, so more specific patterns must be registered first. The
//! registry is built once at startup and never mutated afterwards.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::Regex;
use url::Url;

use crate::config::ExtractorsConfig;
use crate::error::{Error, Result};
use crate::extractors::{Extractor, ImgurExtractor, OpenGraphExtractor};

static GLOBAL: OnceCell<ExtractorRegistry> = OnceCell::new();

/// Predicate deciding whether a registration applies to a URL.
pub enum UrlPattern {
    /// Regex matched against the full URL.
    Regex(Regex),
    /// Host name, also matching any subdomain.
    Host(String),
    /// Arbitrary predicate.
    Predicate(Box<dyn Fn(&Url) -> bool + Send + Sync>),
}

impl UrlPattern {
    pub fn host(host: impl Into<String>) -> Self {
        UrlPattern::Host(host.into().trim_start_matches("www.").to_ascii_lowercase())
    }

    pub fn matches(&self, url: &Url) -> bool {
        match self {
            UrlPattern::Regex(re) => re.is_match(url.as_str()),
            UrlPattern::Host(host) => url.host_str().is_some_and(|h| {
                let h = h.to_ascii_lowercase();
                h == *host
                    || h.strip_suffix(host.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }),
            UrlPattern::Predicate(f) => f(url),
        }
    }
}

impl fmt::Debug for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlPattern::Regex(re) => write!(f, "Regex({})", re.as_str()),
            UrlPattern::Host(host) => write!(f, "Host({})", host),
            UrlPattern::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

struct Registration {
    pattern: UrlPattern,
    extractor: Arc<dyn Extractor>,
}

/// Ordered list of extraction strategies keyed by URL pattern.
#[derive(Default)]
pub struct ExtractorRegistry {
    registrations: Vec<Registration>,
}

impl ExtractorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in strategies, most specific first.
    pub fn with_builtin(config: &ExtractorsConfig) -> Self {
        let mut registry = Self::new();
        registry.register(ImgurExtractor::pattern(), Arc::new(ImgurExtractor));

        let opengraph: Arc<dyn Extractor> = Arc::new(OpenGraphExtractor);
        for host in &config.opengraph_hosts {
            registry.register(UrlPattern::host(host), Arc::clone(&opengraph));
        }
        registry
    }

    /// Append a registration. Earlier registrations take priority.
    pub fn register(&mut self, pattern: UrlPattern, extractor: Arc<dyn Extractor>) -> &mut Self {
        tracing::debug!(
            "Registering extractor {} for {:?}",
            extractor.name(),
            pattern
        );
        self.registrations.push(Registration { pattern, extractor });
        self
    }

    /// Pick the strategy for a resolved URL: first match in registration order.
    pub fn select(&self, url: &Url) -> Result<Arc<dyn Extractor>> {
        self.registrations
            .iter()
            .find(|r| r.pattern.matches(url))
            .map(|r| Arc::clone(&r.extractor))
            .ok_or_else(|| Error::UrlNotSupported {
                url: url.to_string(),
            })
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.registrations
                    .iter()
                    .map(|r| (r.extractor.name(), &r.pattern)),
            )
            .finish()
    }
}

/// Install the process-wide registry. Only the first call has an effect.
pub fn init(registry: ExtractorRegistry) -> &'static ExtractorRegistry {
    GLOBAL.get_or_init(|| registry)
}

/// The process-wide registry, if [`init`] has run.
pub fn global() -> Option<&'static ExtractorRegistry> {
    GLOBAL.get()
}
