use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::RwLock;

use crate::{ByteStream, CheckedStream, MediaError, MediaResult};

const READ_CHUNK: usize = 64 * 1024;

/// Storage primitives behind a [`crate::MediaAdapter`].
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `stream` under `key`. If the stream fails, nothing is left under `key`.
    async fn put(&self, key: &str, stream: CheckedStream<'_>) -> MediaResult<PutResult>;

    async fn get(&self, key: &str) -> MediaResult<GetResult>;

    async fn delete(&self, key: &str) -> MediaResult<()>;
}

#[derive(Debug, Clone)]
pub struct PutResult {
    pub size_bytes: u64,
}

pub struct GetResult {
    pub stream: ByteStream<'static>,
    pub size_bytes: u64,
}

/// Files in one flat directory. Writes land in a hidden `.part` file that is
/// renamed into place once the stream completes.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    /// Creates `root` if it does not exist yet.
    pub async fn open(root: impl Into<PathBuf>) -> MediaResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    async fn write_all(file: &mut File, mut stream: CheckedStream<'_>) -> MediaResult<u64> {
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

fn read_chunks(mut file: File) -> impl Stream<Item = io::Result<Bytes>> + Send {
    async_stream::try_stream! {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            yield Bytes::copy_from_slice(&buf[..n]);
        }
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn put(&self, key: &str, stream: CheckedStream<'_>) -> MediaResult<PutResult> {
        let target = self.path_for(key);
        let temp = self.path_for(&format!(".{key}.part"));

        let mut file = File::create(&temp).await?;
        let written = Self::write_all(&mut file, stream).await;
        drop(file);

        let stored = match written {
            Ok(size_bytes) => fs::rename(&temp, &target)
                .await
                .map(|()| PutResult { size_bytes })
                .map_err(MediaError::from),
            Err(err) => Err(err),
        };

        if stored.is_err() {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                tracing::warn!(path = %temp.display(), error = %cleanup, "failed to remove partial upload");
            }
        }
        stored
    }

    async fn get(&self, key: &str) -> MediaResult<GetResult> {
        let path = self.path_for(key);
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(MediaError::not_found(key)),
            Err(e) => return Err(e.into()),
        };
        let size_bytes = file.metadata().await?.len();

        Ok(GetResult {
            stream: Box::pin(read_chunks(file)),
            size_bytes,
        })
    }

    async fn delete(&self, key: &str) -> MediaResult<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(MediaError::not_found(key)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps every object in memory. For tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryMediaStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn put(&self, key: &str, mut stream: CheckedStream<'_>) -> MediaResult<PutResult> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }

        let data = buf.freeze();
        let size_bytes = data.len() as u64;
        self.objects.write().await.insert(key.to_string(), data);
        Ok(PutResult { size_bytes })
    }

    async fn get(&self, key: &str) -> MediaResult<GetResult> {
        let data = self
            .objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| MediaError::not_found(key))?;

        let size_bytes = data.len() as u64;
        Ok(GetResult {
            stream: futures::stream::once(async move { Ok(data) }).boxed(),
            size_bytes,
        })
    }

    async fn delete(&self, key: &str) -> MediaResult<()> {
        self.objects
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| MediaError::not_found(key))
    }
}
