use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};
use quill_core::{load_env_config, QuillApp};
use quill_media::DEFAULT_MAX_BYTES;
use serde_json::Value;

use crate::services::posts::preview::DEFAULT_PREVIEW_CHARS;
use crate::services::BlogParams;

/// Fill the app config from the environment, falling back to defaults.
/// `QUILL__SECTION__KEY` variables are applied last and win.
pub fn config(app: &QuillApp<Value, BlogParams>) -> Result<()> {
    configure_http(app);
    configure_posts(app);
    configure_media(app);

    let overrides = load_env_config(app, "QUILL__");
    if overrides > 0 {
        tracing::debug!(count = overrides, "applied QUILL__ config overrides");
    }
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn configure_http(app: &QuillApp<Value, BlogParams>) {
    app.set("http.host", env_or("HTTP_HOST", "127.0.0.1"));
    app.set("http.port", env_or("HTTP_PORT", "3000"));
    app.set("http.staticDir", env_or("STATIC_DIR", "static"));
}

fn configure_posts(app: &QuillApp<Value, BlogParams>) {
    app.set("posts.store", env_or("QUILL_POSTS_STORE", "file"));
    app.set("posts.dataDir", env_or("QUILL_DATA_DIR", "data"));
    app.set(
        "posts.previewChars",
        env_or("QUILL_PREVIEW_CHARS", &DEFAULT_PREVIEW_CHARS.to_string()),
    );
}

fn configure_media(app: &QuillApp<Value, BlogParams>) {
    app.set("media.store", env_or("QUILL_MEDIA_STORE", "file"));
    app.set("media.uploadDir", env_or("QUILL_UPLOAD_DIR", "uploads"));
    app.set(
        "media.maxUploadMb",
        env_or("QUILL_MAX_UPLOAD_MB", &(DEFAULT_MAX_BYTES / (1024 * 1024)).to_string()),
    );
}

/// Where a store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    Dir(PathBuf),
}

/// Typed view of the settings `build` needs, read after every override has
/// been applied.
#[derive(Debug, Clone)]
pub struct BlogSettings {
    pub posts: StoreLocation,
    pub media: StoreLocation,
    pub max_upload_bytes: u64,
    pub static_dir: PathBuf,
}

fn store_location(app: &QuillApp<Value, BlogParams>, kind_key: &str, dir_key: &str, default_dir: &str) -> Result<StoreLocation> {
    let kind = app.get(kind_key).unwrap_or_else(|| "file".to_string());
    match kind.as_str() {
        "memory" => Ok(StoreLocation::Memory),
        "file" => Ok(StoreLocation::Dir(PathBuf::from(
            app.get(dir_key).unwrap_or_else(|| default_dir.to_string()),
        ))),
        other => bail!("{kind_key} must be \"file\" or \"memory\", got {other:?}"),
    }
}

impl BlogSettings {
    pub fn from_app(app: &QuillApp<Value, BlogParams>) -> Result<Self> {
        let snapshot = app.config_snapshot();

        let max_upload_mb = match snapshot.get("media.maxUploadMb") {
            None => DEFAULT_MAX_BYTES / (1024 * 1024),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(mb) if mb > 0 => mb,
                _ => bail!("media.maxUploadMb must be a positive whole number, got {raw:?}"),
            },
        };

        if let Some(raw) = snapshot.get("posts.previewChars") {
            if snapshot.get_usize("posts.previewChars").is_none() {
                bail!("posts.previewChars must be a whole number, got {raw:?}");
            }
        }

        Ok(Self {
            posts: store_location(app, "posts.store", "posts.dataDir", "data")?,
            media: store_location(app, "media.store", "media.uploadDir", "uploads")?,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            static_dir: PathBuf::from(snapshot.get_string("http.staticDir").unwrap_or_else(|| "static".to_string())),
        })
    }
}
