use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use quill_core::errors::QuillError;
use tokio::sync::RwLock;

use crate::services::posts::post::{advance, newest_first, Post, PostIds};

const POSTS_FILE: &str = "posts.json";

#[derive(Default)]
struct Posts {
    by_id: HashMap<String, Post>,
    ids: PostIds,
}

/// Post persistence. Either purely in memory, or mirrored to a
/// `posts.json` file that is rewritten (temp file + rename) on every change.
pub struct PostStore {
    posts: RwLock<Posts>,
    file: Option<PathBuf>,
}

fn not_found(id: &str) -> anyhow::Error {
    QuillError::not_found(format!("Post not found: {id}")).into_anyhow()
}

impl PostStore {
    pub fn in_memory() -> Self {
        Self {
            posts: RwLock::new(Posts::default()),
            file: None,
        }
    }

    /// Open the store kept in `dir`, creating the directory if needed.
    /// A missing `posts.json` means no posts yet.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating data directory {}", dir.display()))?;

        let file = dir.join(POSTS_FILE);
        let loaded: Vec<Post> = match tokio::fs::read(&file).await {
            Ok(bytes) => serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", file.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e).with_context(|| format!("reading {}", file.display())),
        };

        let mut posts = Posts::default();
        for post in loaded {
            posts.ids.observe(post.sequence());
            posts.by_id.insert(post.id.clone(), post);
        }
        tracing::info!(path = %file.display(), count = posts.by_id.len(), "loaded posts");

        Ok(Self {
            posts: RwLock::new(posts),
            file: Some(file),
        })
    }

    async fn persist(&self, by_id: &HashMap<String, Post>) -> Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };

        let mut all: Vec<&Post> = by_id.values().collect();
        all.sort_by(|a, b| newest_first(a, b));
        let json = serde_json::to_vec_pretty(&all).context("encoding posts")?;

        let temp = file.with_extension("json.tmp");
        tokio::fs::write(&temp, json)
            .await
            .with_context(|| format!("writing {}", temp.display()))?;
        tokio::fs::rename(&temp, file)
            .await
            .with_context(|| format!("replacing {}", file.display()))?;
        Ok(())
    }

    /// Every post, newest first.
    pub async fn list(&self) -> Vec<Post> {
        let posts = self.posts.read().await;
        let mut all: Vec<Post> = posts.by_id.values().cloned().collect();
        all.sort_by(newest_first);
        all
    }

    pub async fn get(&self, id: &str) -> Result<Post> {
        self.posts.read().await.by_id.get(id).cloned().ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, title: String, content: String) -> Result<Post> {
        let mut posts = self.posts.write().await;
        let (id, created_at) = posts.ids.next(Utc::now());

        let post = Post {
            id: id.to_string(),
            title,
            content,
            created_at,
            updated_at: created_at,
        };

        let mut next = posts.by_id.clone();
        next.insert(post.id.clone(), post.clone());
        self.persist(&next).await?;
        posts.by_id = next;

        Ok(post)
    }

    /// Replace the given fields; `None` keeps the stored value.
    pub async fn update(&self, id: &str, title: Option<String>, content: Option<String>) -> Result<Post> {
        let mut posts = self.posts.write().await;
        let mut post = posts.by_id.get(id).cloned().ok_or_else(|| not_found(id))?;

        if let Some(title) = title {
            post.title = title;
        }
        if let Some(content) = content {
            post.content = content;
        }
        post.updated_at = advance(post.updated_at, Utc::now());

        let mut next = posts.by_id.clone();
        next.insert(post.id.clone(), post.clone());
        self.persist(&next).await?;
        posts.by_id = next;

        Ok(post)
    }

    pub async fn delete(&self, id: &str) -> Result<Post> {
        let mut posts = self.posts.write().await;

        let mut next = posts.by_id.clone();
        let removed = next.remove(id).ok_or_else(|| not_found(id))?;
        self.persist(&next).await?;
        posts.by_id = next;

        Ok(removed)
    }
}
