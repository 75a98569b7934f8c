use std::path::Path;

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::MediaResult;

/// Incoming file bytes, possibly borrowing from the request they came from.
pub type ByteStream<'a> = BoxStream<'a, std::io::Result<Bytes>>;

/// Bytes that already passed the upload rules; stores only see these.
pub type CheckedStream<'a> = BoxStream<'a, MediaResult<Bytes>>;

/// What the uploader told us about a file.
#[derive(Debug, Clone, Default)]
pub struct MediaPut {
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl MediaPut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lower-cased final extension of the original filename.
    pub fn extension(&self) -> Option<String> {
        extension_of(self.filename.as_deref()?)
    }
}

pub(crate) fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

/// `<unix-millis>-<12 hex chars>.<ext>`
pub(crate) fn stored_name(extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{millis}-{}.{extension}", &suffix[..12])
}

/// Stored names are flat: no separators, no parent references.
pub(crate) fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_uses_the_last_dot_and_lowercases() {
        assert_eq!(extension_of("Holiday.Photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn stored_names_are_unique_and_keep_the_extension() {
        let a = stored_name("png");
        let b = stored_name("png");
        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
        let (millis, rest) = a.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest.len(), 12 + ".png".len());
    }

    #[test]
    fn traversal_names_are_unsafe() {
        assert!(is_safe_name("1700000000000-abcdef012345.png"));
        assert!(!is_safe_name("../posts.json"));
        assert!(!is_safe_name("a/b.png"));
        assert!(!is_safe_name("a\\b.png"));
        assert!(!is_safe_name(".hidden.png"));
        assert!(!is_safe_name(""));
    }
}
