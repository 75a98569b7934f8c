use std::sync::Arc;

use futures::StreamExt;

use crate::config::content_type_for;
use crate::types::{extension_of, is_safe_name, stored_name};
use crate::{ByteStream, MediaConfig, MediaError, MediaPut, MediaReceipt, MediaResult, MediaStore, OpenedMedia};

/// Applies the upload rules on top of a [`MediaStore`].
#[derive(Clone)]
pub struct MediaAdapter {
    store: Arc<dyn MediaStore>,
    config: MediaConfig,
}

impl MediaAdapter {
    pub fn new<S: MediaStore + 'static>(store: S, config: MediaConfig) -> Self {
        Self::from_arc(Arc::new(store), config)
    }

    pub fn from_arc(store: Arc<dyn MediaStore>, config: MediaConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Store an upload under a fresh name.
    ///
    /// The extension is checked before any byte is read. The size limit is
    /// checked as bytes arrive, so an oversized upload fails without being
    /// buffered and leaves nothing behind. Empty uploads are rejected.
    pub async fn put(&self, put: MediaPut, body: ByteStream<'_>) -> MediaResult<MediaReceipt> {
        let extension = put.extension().unwrap_or_default();
        if !self.config.allows(&extension) {
            return Err(MediaError::disallowed(extension));
        }

        let filename = stored_name(&extension);
        let limit_bytes = self.config.max_bytes;
        let mut seen = 0u64;
        let checked = body
            .map(move |chunk| {
                let chunk = chunk.map_err(|e| MediaError::Interrupted { message: e.to_string() })?;
                seen += chunk.len() as u64;
                if seen > limit_bytes {
                    return Err(MediaError::TooLarge { limit_bytes });
                }
                Ok(chunk)
            })
            .boxed();

        let stored = self.store.put(&filename, checked).await?;
        if stored.size_bytes == 0 {
            self.store.delete(&filename).await?;
            return Err(MediaError::Empty);
        }

        tracing::info!(
            filename = %filename,
            original = ?put.filename,
            size = stored.size_bytes,
            "stored upload"
        );

        Ok(MediaReceipt {
            url: self.config.public_url(&filename),
            content_type: content_type_for(&extension).to_string(),
            filename,
            size_bytes: stored.size_bytes,
            created_at: chrono::Utc::now(),
        })
    }

    /// Open a stored file by the name [`MediaAdapter::put`] gave it.
    pub async fn open(&self, name: &str) -> MediaResult<OpenedMedia> {
        if !is_safe_name(name) {
            return Err(MediaError::not_found(name));
        }
        let extension = extension_of(name).unwrap_or_default();

        let found = self.store.get(name).await?;
        Ok(OpenedMedia {
            content_type: content_type_for(&extension),
            size_bytes: found.size_bytes,
            stream: found.stream,
        })
    }
}
