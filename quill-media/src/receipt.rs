use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{ByteStream, MediaResult};

/// Receipt returned after successfully storing an upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaReceipt {
    /// Public URL the file is served at
    pub url: String,
    /// Stored filename, unique per upload
    pub filename: String,
    pub content_type: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// A stored file opened for reading
pub struct OpenedMedia {
    pub content_type: &'static str,
    pub size_bytes: u64,
    pub stream: ByteStream<'static>,
}

impl OpenedMedia {
    /// Read the whole file into memory.
    pub async fn into_bytes(self) -> MediaResult<Vec<u8>> {
        use futures::TryStreamExt;

        let chunks: Vec<bytes::Bytes> = self.stream.try_collect().await?;
        Ok(chunks.concat())
    }
}
