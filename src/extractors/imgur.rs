//! Imgur post, album and gallery pages.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::extractors::{Extractor, UrlPattern};
use crate::fetch::ResolvedDocument;
use crate::media::{MediaDescriptor, MediaKind};

const NAME: &str = "imgur";

/// Prefix of the inline script carrying the post's data.
const POST_DATA_PREFIX: &str = "window.postDataJSON=";

static SCRIPT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("static selector is valid"));

/// Reads the `window.postDataJSON` blob embedded in imgur pages.
pub struct ImgurExtractor;

#[derive(Debug, Deserialize)]
struct ImgurPostData {
    #[serde(default)]
    media: Vec<ImgurPostMedia>,
}

#[derive(Debug, Deserialize)]
struct ImgurPostMedia {
    url: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    media_type: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

impl ImgurExtractor {
    /// URL pattern for imgur posts, albums and galleries.
    pub fn pattern() -> UrlPattern {
        UrlPattern::Regex(
            Regex::new(r"^https?://(?:www\.|m\.)?imgur\.com/(?:a/|gallery/|t/[^/]+/)?[A-Za-z0-9_-]+")
                .expect("static regex is valid"),
        )
    }

    fn parse_post_data(raw: &str) -> Option<ImgurPostData> {
        let raw = raw.trim().trim_end_matches(';');

        // Usually a JSON string holding the JSON document, sometimes the object itself.
        match serde_json::from_str::<String>(raw) {
            Ok(inner) => serde_json::from_str(&inner).ok(),
            Err(_) => serde_json::from_str(raw).ok(),
        }
    }
}

impl Extractor for ImgurExtractor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extract(&self, document: &ResolvedDocument) -> Result<Vec<MediaDescriptor>> {
        let html = document.html();

        let raw = html
            .select(&SCRIPT)
            .find_map(|script| {
                let text: String = script.text().collect();
                text.trim_start()
                    .strip_prefix(POST_DATA_PREFIX)
                    .map(ToString::to_string)
            })
            .ok_or_else(|| Error::extraction(NAME, "post data script not found"))?;

        let data = Self::parse_post_data(&raw)
            .ok_or_else(|| Error::extraction(NAME, "post data is not valid JSON"))?;

        tracing::trace!("Got post data from imgur: {:?}", &data);

        let descriptors = data
            .media
            .into_iter()
            .filter(|m| !m.url.is_empty())
            .map(|m| {
                let kind = match (m.mime_type.as_deref(), m.media_type.as_deref()) {
                    (Some(mime), _) => MediaKind::from_mime(mime),
                    (None, Some(t)) => MediaKind::from_mime(t),
                    (None, None) => MediaKind::from_url(&m.url),
                };
                MediaDescriptor::new(m.url)
                    .with_name(m.name.unwrap_or_default())
                    .with_kind(kind)
            })
            .collect();

        Ok(descriptors)
    }
}
