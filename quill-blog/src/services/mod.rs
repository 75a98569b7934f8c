use std::sync::Arc;

use quill_core::{QuillApp, QuillService};
use serde_json::Value;

pub mod adapters;
pub mod media;
pub mod posts;
pub mod types;

pub use types::BlogParams;

use adapters::PostStore;
use media::MediaService;

pub struct BlogServices {
    pub posts: Arc<dyn QuillService<Value, BlogParams>>,
    pub media: Arc<MediaService>,
}

/// Wire the services to their stores. Registration happens when the axum
/// app mounts them; hooks are attached by [`register_hooks`].
pub fn configure(store: Arc<PostStore>, media: MediaService) -> BlogServices {
    BlogServices {
        posts: Arc::new(posts::PostsService::new(store)),
        media: Arc::new(media),
    }
}

pub fn register_hooks(app: &QuillApp<Value, BlogParams>) -> anyhow::Result<()> {
    posts::posts_shared::register_hooks(app, crate::POSTS_PATH.trim_start_matches('/'))
}
