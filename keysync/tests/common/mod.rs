//! Shared helpers for keysync integration tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use keysync::clients::{FetchError, LocalFs, User, UserSource};
use keysync::{KeyDirectory, Runner, RunnerOptions};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// User directory whose contents the test can change between cycles.
#[derive(Clone, Default)]
pub struct FakeDirectory {
    users: Arc<Mutex<Vec<User>>>,
}

impl FakeDirectory {
    pub fn new(users: &[(&str, &str)]) -> Self {
        let dir = Self::default();
        dir.set(users);
        dir
    }

    pub fn set(&self, users: &[(&str, &str)]) {
        *self.users.lock().unwrap() = users
            .iter()
            .map(|(name, key)| User::new(*name, *key))
            .collect();
    }
}

#[async_trait]
impl UserSource for FakeDirectory {
    async fn fetch_users(&self, cancel: &CancellationToken) -> Result<Vec<User>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        Ok(self.users.lock().unwrap().clone())
    }
}

/// A key directory inside a temp dir, reconciled against a fake directory.
pub struct TestSync {
    pub runner: Runner<KeyDirectory<LocalFs, FakeDirectory>>,
    pub users: FakeDirectory,
    pub keys: PathBuf,
    _tmp: TempDir,
}

impl TestSync {
    pub fn new(users: &[(&str, &str)], dry_run: bool) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let keys = tmp.path().join("keys");
        let users = FakeDirectory::new(users);
        let runner = Runner::new(
            KeyDirectory::new(keys.clone(), LocalFs, users.clone()),
            RunnerOptions {
                dry_run,
                run_once: true,
                interval: Duration::from_millis(10),
            },
        );
        Self {
            runner,
            users,
            keys,
            _tmp: tmp,
        }
    }

    pub fn write_key(&self, name: &str, content: &str) {
        std::fs::create_dir_all(&self.keys).unwrap();
        std::fs::write(self.keys.join(name), content).unwrap();
    }

    pub fn read_key(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.keys.join(name)).ok()
    }

    pub fn key_names(&self) -> Vec<String> {
        list(&self.keys)
    }
}

fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}
