use thiserror::Error;

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while storing or serving media
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("File type not allowed: {extension}")]
    DisallowedExtension { extension: String },

    #[error("File exceeds the {limit_bytes} byte limit")]
    TooLarge { limit_bytes: u64 },

    #[error("File is empty")]
    Empty,

    #[error("Media not found: {name}")]
    NotFound { name: String },

    #[error("Upload interrupted: {message}")]
    Interrupted { message: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl MediaError {
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn disallowed<S: Into<String>>(extension: S) -> Self {
        Self::DisallowedExtension {
            extension: extension.into(),
        }
    }

    /// Whether the caller sent something unacceptable, as opposed to the
    /// store failing.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DisallowedExtension { .. } | Self::TooLarge { .. } | Self::Empty | Self::Interrupted { .. }
        )
    }
}
