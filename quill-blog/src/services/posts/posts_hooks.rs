use anyhow::Result;
use async_trait::async_trait;
use quill_core::validation::validate;
use quill_core::{AfterHook, BeforeHook, HookContext, HookResult};
use serde_json::{json, Map, Value};

use crate::services::BlogParams;

use super::posts_schema::{CreatePost, UpdatePost, INVALID_POST};
use super::preview::{Previewer, DEFAULT_PREVIEW_CHARS};
use super::Post;

/// Rejects create payloads without a non-blank title and content, and drops
/// any other fields.
pub struct ValidateCreatePost;

#[async_trait]
impl BeforeHook<Value, BlogParams> for ValidateCreatePost {
    async fn run(&self, ctx: &mut HookContext<Value, BlogParams>) -> Result<()> {
        let data = ctx.data.take().unwrap_or(Value::Null);
        let post: CreatePost = validate(&data, INVALID_POST)?;

        ctx.data = Some(json!({
            "title": post.title,
            "content": post.content,
        }));
        Ok(())
    }
}

/// Update payloads may leave fields out, but may not blank them.
pub struct ValidateUpdatePost;

#[async_trait]
impl BeforeHook<Value, BlogParams> for ValidateUpdatePost {
    async fn run(&self, ctx: &mut HookContext<Value, BlogParams>) -> Result<()> {
        let data = ctx.data.take().unwrap_or(Value::Null);
        let patch: UpdatePost = validate(&data, INVALID_POST)?;

        let mut out = Map::new();
        if let Some(title) = patch.title {
            out.insert("title".to_string(), Value::String(title));
        }
        if let Some(content) = patch.content {
            out.insert("content".to_string(), Value::String(content));
        }
        ctx.data = Some(Value::Object(out));
        Ok(())
    }
}

/// Turns the posts a `find` returned into list summaries with a text
/// preview. Preview length comes from `posts.previewChars`.
pub struct SummarizeForList {
    previewer: Previewer,
}

impl SummarizeForList {
    pub fn new(previewer: Previewer) -> Self {
        Self { previewer }
    }

    fn summarize(&self, v: Value, max_chars: usize) -> Result<Value> {
        let post: Post = serde_json::from_value(v)?;
        let preview = self.previewer.preview(&post.content, max_chars);
        Ok(serde_json::to_value(post.summary(preview))?)
    }
}

#[async_trait]
impl AfterHook<Value, BlogParams> for SummarizeForList {
    async fn run(&self, ctx: &mut HookContext<Value, BlogParams>) -> Result<()> {
        let max_chars = ctx
            .config
            .get_usize("posts.previewChars")
            .unwrap_or(DEFAULT_PREVIEW_CHARS);

        let Some(HookResult::Many(posts)) = ctx.result.take() else {
            return Ok(());
        };

        let summaries = posts
            .into_iter()
            .map(|v| self.summarize(v, max_chars))
            .collect::<Result<Vec<_>>>()?;
        ctx.result = Some(HookResult::Many(summaries));
        Ok(())
    }
}
