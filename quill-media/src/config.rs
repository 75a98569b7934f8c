use std::collections::BTreeSet;

/// Upload rules for a media adapter
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Largest accepted upload, in bytes
    pub max_bytes: u64,

    /// Lower-cased file extensions accepted for upload
    pub allowed_extensions: BTreeSet<String>,

    /// URL prefix stored files are served under
    pub public_prefix: String,
}

pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;

const DEFAULT_EXTENSIONS: [&str; 9] = ["jpg", "jpeg", "png", "gif", "webp", "mp4", "webm", "mov", "svg"];

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            public_prefix: "/uploads".to_string(),
        }
    }
}

impl MediaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(mut self, bytes: u64) -> Self {
        self.max_bytes = bytes;
        self
    }

    pub fn with_public_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.public_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn allow_extension<S: AsRef<str>>(mut self, extension: S) -> Self {
        self.allowed_extensions
            .insert(extension.as_ref().trim_start_matches('.').to_ascii_lowercase());
        self
    }

    pub fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(extension)
    }

    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix, filename)
    }
}

/// Content type served for a stored file's extension.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}
