//! Media descriptor representation.

use std::fmt;

use crate::media::mime::extension_from_url;

/// Kind of media content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    #[default]
    Unknown,
}

impl MediaKind {
    /// Infer the kind from a MIME type such as `image/jpeg`.
    pub fn from_mime(mimetype: &str) -> Self {
        let mimetype = mimetype.to_ascii_lowercase();
        if mimetype.starts_with("image") {
            MediaKind::Image
        } else if mimetype.starts_with("video") || mimetype.contains("mpegurl") {
            MediaKind::Video
        } else if mimetype.starts_with("audio") {
            MediaKind::Audio
        } else {
            MediaKind::Unknown
        }
    }

    /// Infer the kind from a file extension (without dot).
    pub fn from_extension(ext: &str) -> Self {
        match mime_guess::from_ext(ext).first() {
            Some(mime) => Self::from_mime(mime.essence_str()),
            None => MediaKind::Unknown,
        }
    }

    /// Infer the kind from the extension of a URL's last path segment.
    pub fn from_url(url: &str) -> Self {
        extension_from_url(url)
            .map(|ext| Self::from_extension(&ext))
            .unwrap_or_default()
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A media resource found on a post page, before it is downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    /// Where to download the resource from.
    pub source_url: String,

    /// Preferred file name. Empty means "derive one from the URL".
    pub suggested_name: String,

    /// Image, video, audio or unknown.
    pub kind: MediaKind,

    /// Expected MD5 of the content (lowercase hex), when the page publishes one.
    pub checksum: Option<String>,
}

impl MediaDescriptor {
    /// Create a descriptor with no suggested name, guessing the kind from the URL.
    pub fn new(source_url: impl Into<String>) -> Self {
        let source_url = source_url.into();
        let kind = MediaKind::from_url(&source_url);
        Self {
            source_url,
            suggested_name: String::new(),
            kind,
            checksum: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.suggested_name = name.into();
        self
    }

    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into().to_ascii_lowercase());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(
            MediaKind::from_mime("application/vnd.apple.mpegurl"),
            MediaKind::Video
        );
        assert_eq!(MediaKind::from_mime("audio/ogg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_mime("text/html"), MediaKind::Unknown);
    }

    #[test]
    fn test_descriptor_guesses_kind_from_url() {
        let d = MediaDescriptor::new("https://cdn.example.com/a/b/clip.mp4?sig=1");
        assert_eq!(d.kind, MediaKind::Video);
        assert!(d.suggested_name.is_empty());

        let d = MediaDescriptor::new("https://cdn.example.com/a/b/photo.JPG");
        assert_eq!(d.kind, MediaKind::Image);

        let d = MediaDescriptor::new("https://cdn.example.com/watch");
        assert_eq!(d.kind, MediaKind::Unknown);
    }

    #[test]
    fn test_checksum_is_normalized() {
        let d = MediaDescriptor::new("https://x/y.png").with_checksum("ABCDEF");
        assert_eq!(d.checksum.as_deref(), Some("abcdef"));
    }
}
