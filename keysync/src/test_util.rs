//! In-memory fakes for the filesystem and the user directory.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::clients::{FetchError, Filesystem, User, UserSource};

#[derive(Default)]
struct Inner {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    fail_read: HashSet<PathBuf>,
    fail_write: HashSet<PathBuf>,
    fail_remove: HashSet<PathBuf>,
    written: Vec<PathBuf>,
    removed: Vec<PathBuf>,
}

/// Shared in-memory filesystem. Clones see the same state.
#[derive(Clone, Default)]
pub struct MemoryFs {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryFs {
    /// A filesystem with `dir` and the given files inside it.
    pub fn with_files(dir: &str, files: &[(&str, &str)]) -> Self {
        let fs = Self::default();
        {
            let mut inner = fs.inner.lock().unwrap();
            inner.dirs.insert(PathBuf::from(dir));
            for (name, content) in files {
                inner
                    .files
                    .insert(Path::new(dir).join(name), content.as_bytes().to_vec());
            }
        }
        fs
    }

    pub fn content(&self, path: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .files
            .get(Path::new(path))
            .map(|c| String::from_utf8_lossy(c).into_owned())
    }

    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().files.get(Path::new(path)).cloned()
    }

    /// Store raw bytes, bypassing the write log.
    pub fn put_bytes(&self, path: &str, content: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.files.insert(PathBuf::from(path), content.to_vec());
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.inner.lock().unwrap().dirs.contains(Path::new(path))
    }

    pub fn written(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().written.clone()
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().removed.clone()
    }

    pub fn fail_read(&self, path: &str) {
        self.inner.lock().unwrap().fail_read.insert(path.into());
    }

    pub fn fail_write(&self, path: &str) {
        self.inner.lock().unwrap().fail_write.insert(path.into());
    }

    pub fn fail_remove(&self, path: &str) {
        self.inner.lock().unwrap().fail_remove.insert(path.into());
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, path.display().to_string())
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, path.display().to_string())
}

#[async_trait]
impl Filesystem for MemoryFs {
    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        if !inner.dirs.contains(path) {
            return Err(not_found(path));
        }
        let children = inner.files.keys().chain(inner.dirs.iter());
        let mut names: Vec<String> = children
            .filter(|p| p.parent() == Some(path))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_read.contains(path) {
            return Err(denied(path));
        }
        inner.files.get(path).cloned().ok_or_else(|| not_found(path))
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match path.parent() {
            Some(parent) if inner.dirs.contains(parent) => {}
            _ => return Err(not_found(path)),
        }
        if inner.fail_write.contains(path) {
            return Err(denied(path));
        }
        inner.files.insert(path.to_path_buf(), contents.to_vec());
        inner.written.push(path.to_path_buf());
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_remove.contains(path) {
            return Err(denied(path));
        }
        inner.files.remove(path).ok_or_else(|| not_found(path))?;
        inner.removed.push(path.to_path_buf());
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        for dir in path.ancestors() {
            if !dir.as_os_str().is_empty() {
                inner.dirs.insert(dir.to_path_buf());
            }
        }
        Ok(())
    }
}

/// User source returning a fixed list, or a fixed error.
pub struct StaticUsers {
    users: Vec<User>,
    error: Option<fn() -> FetchError>,
}

impl StaticUsers {
    pub fn new(users: Vec<User>) -> Self {
        Self { users, error: None }
    }

    pub fn failing(error: fn() -> FetchError) -> Self {
        Self {
            users: Vec::new(),
            error: Some(error),
        }
    }
}

#[async_trait]
impl UserSource for StaticUsers {
    async fn fetch_users(&self, cancel: &CancellationToken) -> Result<Vec<User>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        match self.error {
            Some(error) => Err(error()),
            None => Ok(self.users.clone()),
        }
    }
}
