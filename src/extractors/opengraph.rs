//! Generic strategy for pages that publish their media as OpenGraph tags.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::Selector;

use crate::error::{Error, Result};
use crate::extractors::Extractor;
use crate::fetch::ResolvedDocument;
use crate::media::{MediaDescriptor, MediaKind};

const NAME: &str = "opengraph";

static META: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property], meta[name]").expect("static selector is valid"));

/// Reads `og:video`, `og:image` and `og:audio` meta tags.
pub struct OpenGraphExtractor;

/// How a meta property contributes to the media list.
enum Property {
    /// Starts a new item of the given kind.
    Item(MediaKind),
    /// Better URL for the current item of the given kind.
    SecureUrl(MediaKind),
}

fn classify(property: &str) -> Option<Property> {
    let property = property.to_ascii_lowercase();
    let (kind, rest) = if let Some(rest) = property.strip_prefix("og:video") {
        (MediaKind::Video, rest)
    } else if let Some(rest) = property.strip_prefix("og:image") {
        (MediaKind::Image, rest)
    } else if let Some(rest) = property.strip_prefix("og:audio") {
        (MediaKind::Audio, rest)
    } else {
        return None;
    };

    match rest {
        "" | ":url" => Some(Property::Item(kind)),
        ":secure_url" => Some(Property::SecureUrl(kind)),
        _ => None,
    }
}

impl Extractor for OpenGraphExtractor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extract(&self, document: &ResolvedDocument) -> Result<Vec<MediaDescriptor>> {
        if document.body().trim().is_empty() {
            return Err(Error::extraction(NAME, "page is empty"));
        }

        let html = document.html();
        let mut items: Vec<(MediaKind, String)> = Vec::new();

        for meta in html.select(&META) {
            let element = meta.value();
            let property = match element.attr("property").or_else(|| element.attr("name")) {
                Some(p) => p,
                None => continue,
            };
            let content = match element.attr("content").map(str::trim) {
                Some(c) if !c.is_empty() => c,
                _ => continue,
            };
            let url = match document.resolve_url(content) {
                Some(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
                _ => continue,
            };

            match classify(property) {
                Some(Property::Item(kind)) => items.push((kind, url)),
                Some(Property::SecureUrl(kind)) => {
                    match items.iter_mut().rev().find(|(k, _)| *k == kind) {
                        Some(item) => item.1 = url,
                        None => items.push((kind, url)),
                    }
                }
                None => {}
            }
        }

        // Remove duplicates while preserving order
        let mut seen = HashSet::new();
        items.retain(|(_, url)| seen.insert(url.clone()));

        Ok(items
            .into_iter()
            .map(|(kind, url)| MediaDescriptor::new(url).with_kind(kind))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn doc(body: &str) -> ResolvedDocument {
        ResolvedDocument::new(
            Url::parse("https://blog.tumblr.com/post/1").unwrap(),
            body.to_string(),
        )
    }

    #[test]
    fn test_extracts_tags_in_page_order() {
        let body = r#"<html><head>
            <meta property="og:title" content="A post">
            <meta property="og:video" content="http://cdn.example.com/v.mp4">
            <meta property="og:video:secure_url" content="https://cdn.example.com/v.mp4">
            <meta property="og:video:type" content="video/mp4">
            <meta property="og:image" content="/media/poster.jpg">
            <meta property="og:image" content="/media/poster.jpg">
            <meta name="og:audio" content="https://cdn.example.com/a.mp3">
        </head><body></body></html>"#;

        let media = OpenGraphExtractor.extract(&doc(body)).unwrap();
        let urls: Vec<_> = media.iter().map(|m| m.source_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/v.mp4",
                "https://blog.tumblr.com/media/poster.jpg",
                "https://cdn.example.com/a.mp3",
            ]
        );
        assert_eq!(media[0].kind, MediaKind::Video);
        assert_eq!(media[1].kind, MediaKind::Image);
        assert_eq!(media[2].kind, MediaKind::Audio);
    }

    #[test]
    fn test_page_without_tags_yields_nothing() {
        let media = OpenGraphExtractor
            .extract(&doc("<html><head><title>x</title></head></html>"))
            .unwrap();
        assert!(media.is_empty());
    }

    #[test]
    fn test_empty_page_is_extraction_error() {
        assert!(matches!(
            OpenGraphExtractor.extract(&doc("   ")),
            Err(Error::Extraction { extractor: "opengraph", .. })
        ));
    }

    #[test]
    fn test_ignores_non_http_content() {
        let body = r#"<meta property="og:image" content="data:image/png;base64,AAAA">"#;
        assert!(OpenGraphExtractor.extract(&doc(body)).unwrap().is_empty());
    }
}
