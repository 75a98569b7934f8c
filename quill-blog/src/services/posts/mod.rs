pub mod post;
pub mod posts_hooks;
pub mod posts_schema;
pub mod posts_service;
pub mod posts_shared;
pub mod preview;

pub use post::{Post, PostSummary};
pub use posts_service::PostsService;
