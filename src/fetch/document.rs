//! Fetched post pages.

use scraper::Html;
use url::Url;

use crate::config::parse_post_url;
use crate::error::Result;
use crate::fetch::client::HttpClient;

/// A fetched post page and the URL it was finally served from.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    final_url: Url,
    body: String,
}

impl ResolvedDocument {
    pub fn new(final_url: Url, body: String) -> Self {
        Self { final_url, body }
    }

    /// URL after redirects. Extractor selection matches against this one.
    pub fn final_url(&self) -> &Url {
        &self.final_url
    }

    /// Raw markup.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse the markup into a queryable tree.
    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }

    /// Resolve a possibly relative reference against the final URL.
    pub fn resolve_url(&self, reference: &str) -> Option<Url> {
        self.final_url.join(reference.trim()).ok()
    }
}

/// Normalize a user-supplied URL and fetch the page it points to.
pub async fn fetch_document(client: &HttpClient, raw_url: &str) -> Result<ResolvedDocument> {
    let url = parse_post_url(raw_url)?;
    tracing::info!("Fetching {}", url);
    Ok(client.fetch_document(&url).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::Error;

    #[test]
    fn test_resolve_relative_reference() {
        let doc = ResolvedDocument::new(
            Url::parse("https://example.com/post/1").unwrap(),
            String::new(),
        );
        assert_eq!(
            doc.resolve_url("/media/a.jpg").unwrap().as_str(),
            "https://example.com/media/a.jpg"
        );
        assert_eq!(
            doc.resolve_url("//cdn.example.com/b.mp4").unwrap().as_str(),
            "https://cdn.example.com/b.mp4"
        );
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty_url() {
        let client = HttpClient::new(&Config::default()).unwrap();
        let err = fetch_document(&client, "\\").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
