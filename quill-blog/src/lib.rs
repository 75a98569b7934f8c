//! quill-blog: a small blog server.
//!
//! Posts live under `/api/posts`, media is uploaded to `/api/upload` and
//! served from `/uploads`, and everything else falls through to the static
//! browser client.

mod app;
pub mod config;
mod hooks;
pub mod services;

use std::sync::Arc;

use anyhow::{Context, Result};
use quill_axum::AxumApp;
use quill_core::QuillApp;
use quill_media::{FsMediaStore, MediaAdapter, MediaConfig, MemoryMediaStore};
use serde_json::Value;

use crate::config::{BlogSettings, StoreLocation};
use crate::services::adapters::PostStore;
use crate::services::media::MediaService;
use crate::services::BlogParams;

pub const POSTS_PATH: &str = "/api/posts";
pub const UPLOAD_PATH: &str = "/api/upload";
pub const UPLOAD_FIELD: &str = "file";
pub const MEDIA_PATH: &str = "/uploads";

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Build the app from environment configuration.
pub async fn build() -> Result<AxumApp<Value, BlogParams>> {
    build_with(|_| {}).await
}

/// Like [`build`], with a chance to change config before stores are opened.
pub async fn build_with<F>(configure: F) -> Result<AxumApp<Value, BlogParams>>
where
    F: FnOnce(&QuillApp<Value, BlogParams>),
{
    let ax = app::blog_app()?;
    configure(ax.app.as_ref());
    let settings = BlogSettings::from_app(ax.app.as_ref())?;

    let store = match &settings.posts {
        StoreLocation::Memory => PostStore::in_memory(),
        StoreLocation::Dir(dir) => PostStore::open(dir).await?,
    };

    let media_config = MediaConfig::default()
        .with_max_bytes(settings.max_upload_bytes)
        .with_public_prefix(MEDIA_PATH);
    let media = match &settings.media {
        StoreLocation::Memory => MediaAdapter::new(MemoryMediaStore::new(), media_config),
        StoreLocation::Dir(dir) => {
            let store = FsMediaStore::open(dir)
                .await
                .with_context(|| format!("opening upload directory {}", dir.display()))?;
            MediaAdapter::new(store, media_config)
        }
    };

    let svcs = services::configure(Arc::new(store), MediaService::new(media));
    let body_limit = usize::try_from(settings.max_upload_bytes + MULTIPART_OVERHEAD).unwrap_or(usize::MAX);

    let ax = ax
        .use_service(POSTS_PATH, svcs.posts)
        .use_upload(UPLOAD_PATH, UPLOAD_FIELD, svcs.media.clone(), body_limit)
        .use_files(MEDIA_PATH, svcs.media)
        .service("/health", || async { "ok" })
        .fallback_dir(&settings.static_dir);

    services::register_hooks(ax.app.as_ref())?;

    tracing::debug!(services = ?ax.app.service_names(), "blog app ready");
    Ok(ax)
}
