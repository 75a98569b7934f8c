//! Upload and download routes.
//!
//! Multipart bodies are never buffered here: the matching field is handed
//! to a [`FileSink`] as a byte stream, and served files are streamed back
//! from a [`FileSource`].

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{multipart::{MultipartError, MultipartRejection}, DefaultBodyLimit, Multipart, Path},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use quill_core::errors::QuillError;
use serde_json::Value;

use crate::QuillAxumError;

/// One file part of a multipart request.
pub struct IncomingFile<'a> {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub stream: BoxStream<'a, io::Result<Bytes>>,
}

/// Where uploaded files go. The returned JSON is the response body.
#[async_trait]
pub trait FileSink: Send + Sync {
    async fn accept(&self, file: IncomingFile<'_>) -> anyhow::Result<Value>;
}

pub struct ServedFile {
    pub content_type: String,
    pub size: u64,
    pub stream: BoxStream<'static, io::Result<Bytes>>,
}

/// Where served files come from. Unknown names should fail with a
/// not-found [`QuillError`].
#[async_trait]
pub trait FileSource: Send + Sync {
    async fn open(&self, name: &str) -> anyhow::Result<ServedFile>;
}

fn map_multipart_rejection(rejection: MultipartRejection) -> QuillAxumError {
    QuillError::bad_request(rejection.body_text()).into()
}

fn malformed(err: MultipartError) -> QuillAxumError {
    QuillError::bad_request(format!("Malformed multipart body: {}", err.body_text())).into()
}

async fn receive(
    mut multipart: Multipart,
    field_name: &str,
    sink: &dyn FileSink,
) -> Result<Json<Value>, QuillAxumError> {
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(field_name) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        tracing::debug!(field = %field_name, filename = ?filename, "receiving upload");

        let file = IncomingFile {
            filename,
            content_type,
            stream: field
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.body_text()))
                .boxed(),
        };

        let receipt = sink.accept(file).await?;
        return Ok(Json(receipt));
    }

    Err(QuillError::bad_request(format!("Missing multipart field '{field_name}'")).into())
}

/// `POST /` taking a multipart body and passing the `field_name` part to `sink`.
///
/// Other parts are skipped. `body_limit` caps the whole request body.
pub fn upload_router(field_name: &str, sink: Arc<dyn FileSink>, body_limit: usize) -> Router<()> {
    let field_name = Arc::new(field_name.to_string());

    Router::new()
        .route(
            "/",
            post(move |multipart: Result<Multipart, MultipartRejection>| async move {
                let multipart = multipart.map_err(map_multipart_rejection)?;
                receive(multipart, &field_name, sink.as_ref()).await
            }),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}

/// `GET /{name}` streaming files out of `source`.
pub fn files_router(source: Arc<dyn FileSource>) -> Router<()> {
    Router::new().route(
        "/{name}",
        get(move |Path(name): Path<String>| async move {
            let file = source.open(&name).await?;
            Ok::<Response, QuillAxumError>(
                (
                    [
                        (header::CONTENT_TYPE, file.content_type),
                        (header::CONTENT_LENGTH, file.size.to_string()),
                    ],
                    Body::from_stream(file.stream),
                )
                    .into_response(),
            )
        }),
    )
}
