use async_trait::async_trait;
use quill_axum::{FileSink, FileSource, IncomingFile, ServedFile};
use quill_core::errors::QuillError;
use quill_media::{MediaAdapter, MediaError, MediaPut};
use serde_json::Value;

/// Upload and download of post media, on top of a [`MediaAdapter`].
pub struct MediaService {
    adapter: MediaAdapter,
}

impl MediaService {
    pub fn new(adapter: MediaAdapter) -> Self {
        Self { adapter }
    }
}

fn to_quill(err: MediaError) -> anyhow::Error {
    match err {
        MediaError::NotFound { name } => QuillError::not_found(format!("Media not found: {name}")).into_anyhow(),
        err if err.is_rejection() => QuillError::bad_request(err.to_string()).into_anyhow(),
        err => QuillError::general_error("Failed to store media")
            .with_source(err.into())
            .into_anyhow(),
    }
}

#[async_trait]
impl FileSink for MediaService {
    async fn accept(&self, file: IncomingFile<'_>) -> anyhow::Result<Value> {
        let mut put = MediaPut::new();
        if let Some(filename) = file.filename {
            put = put.with_filename(filename);
        }
        if let Some(content_type) = file.content_type {
            put = put.with_content_type(content_type);
        }

        let receipt = self.adapter.put(put, file.stream).await.map_err(to_quill)?;
        Ok(serde_json::to_value(receipt)?)
    }
}

#[async_trait]
impl FileSource for MediaService {
    async fn open(&self, name: &str) -> anyhow::Result<ServedFile> {
        let opened = self.adapter.open(name).await.map_err(to_quill)?;
        Ok(ServedFile {
            content_type: opened.content_type.to_string(),
            size: opened.size_bytes,
            stream: opened.stream,
        })
    }
}
