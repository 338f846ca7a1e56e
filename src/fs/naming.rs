//! Filename derivation and sanitizing.

use std::path::Path;

use url::Url;

use crate::media::{extension_from_mime, extension_from_url, MediaDescriptor};

/// Longest file name produced, in UTF-8 bytes.
///
/// Leaves room under the common 255-byte limit for the `.<name>.part` staging
/// wrapper and a `_<n>` collision suffix.
pub const MAX_FILENAME_BYTES: usize = 200;

/// Make an untrusted name safe to use as a single path component.
///
/// Separators, reserved and control characters become `_`, `..` sequences are
/// broken up and leading dots removed so the result can never escape the
/// destination directory or collide with staging files. Returns `None` when
/// nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let mut sanitized = sanitized.replace("..", "_");
    sanitized = sanitized.trim().trim_start_matches('.').trim().to_string();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '_') {
        return None;
    }

    Some(truncate_filename(&sanitized, MAX_FILENAME_BYTES))
}

/// Truncate a file name to at most `max` bytes on a char boundary, keeping a short extension.
fn truncate_filename(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }

    let (stem, ext) = match split_extension(name) {
        (stem, Some(ext)) if ext.len() < max / 2 => (stem, Some(ext)),
        _ => (name, None),
    };
    let budget = max - ext.map_or(0, |e| e.len() + 1);
    let stem = &stem[..floor_char_boundary(stem, budget)];

    match ext {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}

/// Largest index `<= max` that falls on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Split `name.ext` into stem and extension. Dotfiles have no extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < name.len() => (&name[..pos], Some(&name[pos + 1..])),
        _ => (name, None),
    }
}

/// Whether a name already carries an extension.
fn has_extension(name: &str) -> bool {
    split_extension(name)
        .1
        .is_some_and(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Last non-empty path segment of a URL.
pub fn filename_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?
        .to_string();
    sanitize_filename(&segment)
}

/// Choose the base file name for a descriptor.
///
/// Preference order: the strategy's suggested name, the URL's last path segment,
/// then `media_<n>` where `n` is the 1-based position in the post. A missing
/// extension is filled in from the URL or the response's content type.
pub fn derive_filename(
    descriptor: &MediaDescriptor,
    index: usize,
    content_type: Option<&str>,
) -> String {
    let base = sanitize_filename(&descriptor.suggested_name)
        .or_else(|| filename_from_url(&descriptor.source_url))
        .unwrap_or_else(|| format!("media_{}", index + 1));

    if has_extension(&base) {
        return base;
    }

    let ext = extension_from_url(&descriptor.source_url)
        .or_else(|| content_type.and_then(extension_from_mime));

    match ext {
        Some(ext) => truncate_filename(&format!("{}.{}", base, ext), MAX_FILENAME_BYTES),
        None => base,
    }
}

/// The `n`-th candidate for a base name: `name.ext`, `name_1.ext`, `name_2.ext`, ...
pub fn candidate_name(base: &str, n: usize) -> String {
    if n == 0 {
        return base.to_string();
    }

    match split_extension(base) {
        (stem, Some(ext)) => format!("{}_{}.{}", stem, n, ext),
        (stem, None) => format!("{}_{}", stem, n),
    }
}

/// Hidden staging name used while `name` is being downloaded.
pub fn staging_name(name: &str) -> String {
    format!(".{}.part", name)
}

/// Whether a directory entry is a staging file.
pub fn is_staging_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') && n.ends_with(".part"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_valid() {
        assert_eq!(sanitize_filename("normal.txt").unwrap(), "normal.txt");
        assert_eq!(sanitize_filename("file:name.txt").unwrap(), "file_name.txt");
        assert_eq!(
            sanitize_filename("file*with?special.txt").unwrap(),
            "file_with_special.txt"
        );
    }

    #[test]
    fn test_sanitize_filename_path_traversal() {
        assert_eq!(sanitize_filename("../etc/passwd").unwrap(), "__etc_passwd");
        assert!(!sanitize_filename("foo/../bar").unwrap().contains(".."));
        assert_eq!(sanitize_filename(".hidden.jpg").unwrap(), "hidden.jpg");
    }

    #[test]
    fn test_sanitize_filename_empty() {
        assert!(sanitize_filename("").is_none());
        assert!(sanitize_filename("   ").is_none());
        assert!(sanitize_filename("/").is_none());
        assert!(sanitize_filename("..").is_none());
    }

    #[test]
    fn test_sanitize_truncates_keeping_extension() {
        let long = format!("{}.jpg", "a".repeat(300));
        let name = sanitize_filename(&long).unwrap();
        assert_eq!(name.len(), MAX_FILENAME_BYTES);
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_sanitize_caps_multibyte_names_by_bytes() {
        let long = format!("{}.jpg", "猫".repeat(100));
        let name = sanitize_filename(&long).unwrap();
        assert!(name.len() <= MAX_FILENAME_BYTES);
        assert!(name.ends_with(".jpg"));
        assert!(name.trim_end_matches(".jpg").chars().all(|c| c == '猫'));
        assert!(staging_name(&candidate_name(&name, 9999)).len() <= 255);
    }

    #[test]
    fn test_truncate_without_usable_extension() {
        let long = format!("a.{}", "b".repeat(300));
        let name = truncate_filename(&long, MAX_FILENAME_BYTES);
        assert_eq!(name.len(), MAX_FILENAME_BYTES);
        assert!(name.starts_with("a."));
    }

    #[test]
    fn test_derive_prefers_suggested_name() {
        let d = MediaDescriptor::new("https://cdn.example.com/x/abc.png").with_name("cat.png");
        assert_eq!(derive_filename(&d, 0, None), "cat.png");
    }

    #[test]
    fn test_derive_adds_extension_to_suggested_name() {
        let d = MediaDescriptor::new("https://cdn.example.com/x/abc.png").with_name("cat");
        assert_eq!(derive_filename(&d, 0, None), "cat.png");
    }

    #[test]
    fn test_derive_from_url() {
        let d = MediaDescriptor::new("https://cdn.example.com/x/abc.png?size=large");
        assert_eq!(derive_filename(&d, 0, None), "abc.png");
    }

    #[test]
    fn test_derive_uses_content_type() {
        let d = MediaDescriptor::new("https://cdn.example.com/media/12345");
        assert_eq!(derive_filename(&d, 0, Some("video/mp4")), "12345.mp4");
    }

    #[test]
    fn test_derive_positional_fallback() {
        let d = MediaDescriptor::new("https://cdn.example.com/");
        assert_eq!(derive_filename(&d, 2, Some("image/jpeg")), "media_3.jpg");
        assert_eq!(derive_filename(&d, 0, None), "media_1");
    }

    #[test]
    fn test_candidate_names() {
        assert_eq!(candidate_name("a.jpg", 0), "a.jpg");
        assert_eq!(candidate_name("a.jpg", 1), "a_1.jpg");
        assert_eq!(candidate_name("archive.tar.gz", 2), "archive.tar_2.gz");
        assert_eq!(candidate_name("noext", 3), "noext_3");
    }

    #[test]
    fn test_staging_names() {
        assert_eq!(staging_name("a.jpg"), ".a.jpg.part");
        assert!(is_staging_file(Path::new("/tmp/.a.jpg.part")));
        assert!(!is_staging_file(Path::new("/tmp/a.jpg")));
    }
}
