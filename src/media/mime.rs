//! Extension and MIME type helpers.

use url::Url;

/// Extract a lowercase extension from a URL's last path segment.
pub fn extension_from_url(url: &str) -> Option<String> {
    // Only the path counts; a bare host like `example.com` has no extension.
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next()?.to_string(),
    };

    let filename = path.rsplit('/').next()?;
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }

    // Validate it looks like an extension (1-10 chars, alphanumeric)
    if !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext.to_lowercase())
    } else {
        None
    }
}

/// Convert a `Content-Type` header value to a file extension.
pub fn extension_from_mime(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();

    // Preferred spellings where the guess table lists an unusual one first.
    let preferred = match essence.as_str() {
        "image/jpeg" => Some("jpg"),
        "video/mp4" => Some("mp4"),
        "video/quicktime" => Some("mov"),
        "audio/mpeg" => Some("mp3"),
        "audio/mp4" => Some("m4a"),
        _ => None,
    };
    if let Some(ext) = preferred {
        return Some(ext.to_string());
    }

    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first())
        .map(|ext| (*ext).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_url() {
        assert_eq!(
            extension_from_url("https://example.com/file.jpg"),
            Some("jpg".to_string())
        );
        assert_eq!(
            extension_from_url("https://example.com/file.jpg?token=abc"),
            Some("jpg".to_string())
        );
        assert_eq!(
            extension_from_url("https://example.com/path/to/file.PNG#frag"),
            Some("png".to_string())
        );
        assert_eq!(extension_from_url("https://example.com/path/"), None);
        assert_eq!(extension_from_url("https://example.com/.hidden"), None);
        assert_eq!(extension_from_url("https://example.com/a.b-c"), None);
        assert_eq!(extension_from_url("https://example.com"), None);
    }

    #[test]
    fn test_extension_from_mime() {
        assert_eq!(extension_from_mime("image/jpeg"), Some("jpg".into()));
        assert_eq!(
            extension_from_mime("video/mp4; codecs=avc1"),
            Some("mp4".into())
        );
        assert_eq!(extension_from_mime("image/png"), Some("png".into()));
        assert_eq!(extension_from_mime("unknown/type"), None);
    }
}
