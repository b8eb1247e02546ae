//! Filesystem capability for the key directory.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Mode for newly created key files.
const KEY_FILE_MODE: u32 = 0o644;

/// Filesystem primitives used by the key directory integration.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Names of all entries directly under `path`, sorted.
    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate `path` and write `contents`.
    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    async fn remove_file(&self, path: &Path) -> io::Result<()>;

    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// The host filesystem via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl Filesystem for LocalFs {
    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().into_string().map_err(|name| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("non UTF-8 file name {:?}", name),
                )
            })?;
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        debug!(path = %path.display(), bytes = contents.len(), "Writing file");
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(KEY_FILE_MODE)
            .open(path)
            .await?;
        file.write_all(contents).await?;
        file.flush().await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        debug!(path = %path.display(), "Removing file");
        tokio::fs::remove_file(path).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }
}
