use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use quill_core::errors::QuillError;
use quill_core::{QuillService, ServiceCapabilities};
use serde_json::Value;

use crate::services::adapters::PostStore;
use crate::services::BlogParams;

use super::posts_schema::{CreatePost, UpdatePost, INVALID_POST};
use super::posts_shared;

pub struct PostsService {
    store: Arc<PostStore>,
}

impl PostsService {
    pub fn new(store: Arc<PostStore>) -> Self {
        Self { store }
    }
}

fn parse<T: serde::de::DeserializeOwned>(data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| {
        QuillError::bad_request(INVALID_POST)
            .with_errors(serde_json::json!({"_schema": [e.to_string()]}))
            .into_anyhow()
    })
}

fn required(field: Option<String>, name: &str) -> Result<String> {
    field.ok_or_else(|| QuillError::bad_request(format!("{name} is required")).into_anyhow())
}

#[async_trait]
impl QuillService<Value, BlogParams> for PostsService {
    fn capabilities(&self) -> ServiceCapabilities {
        posts_shared::crud_capabilities()
    }

    async fn find(&self, _params: BlogParams) -> Result<Vec<Value>> {
        self.store
            .list()
            .await
            .into_iter()
            .map(|post| serde_json::to_value(post).map_err(anyhow::Error::from))
            .collect()
    }

    async fn get(&self, id: &str, _params: BlogParams) -> Result<Value> {
        Ok(serde_json::to_value(self.store.get(id).await?)?)
    }

    async fn create(&self, data: Value, _params: BlogParams) -> Result<Value> {
        let input: CreatePost = parse(data)?;
        let title = required(input.title, "title")?;
        let content = required(input.content, "content")?;

        let post = self.store.create(title, content).await?;
        tracing::debug!(id = %post.id, "created post");
        Ok(serde_json::to_value(post)?)
    }

    async fn update(&self, id: &str, data: Value, _params: BlogParams) -> Result<Value> {
        let input: UpdatePost = parse(data)?;
        let post = self.store.update(id, input.title, input.content).await?;
        Ok(serde_json::to_value(post)?)
    }

    async fn remove(&self, id: &str, _params: BlogParams) -> Result<Value> {
        let post = self.store.delete(id).await?;
        tracing::debug!(id = %post.id, "deleted post");
        Ok(serde_json::to_value(post)?)
    }
}
