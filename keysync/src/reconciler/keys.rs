//! Key directory integration - one file per user holding their public GPG key.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, error, info, warn, Instrument};

use super::{diff, plan, Change, ChangeKind, CycleContext, Integration, Resource};
use crate::clients::{FetchError, Filesystem, User, UserSource};
use crate::error::{Error, Result};
use crate::inventory::ResourceInventory;

/// A user's key file: its name and its raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFiles {
    pub name: String,
    pub content: Vec<u8>,
}

impl Resource for UserFiles {
    fn name(&self) -> &str {
        &self.name
    }

    fn same_content(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

pub type KeyInventory = ResourceInventory<UserFiles, User>;

/// Reconciles `tempdir` against the users returned by the user source.
pub struct KeyDirectory<F, U> {
    tempdir: PathBuf,
    fs: F,
    users: U,
}

impl<F: Filesystem, U: UserSource> KeyDirectory<F, U> {
    pub fn new(tempdir: impl Into<PathBuf>, fs: F, users: U) -> Self {
        Self {
            tempdir: tempdir.into(),
            fs,
            users,
        }
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.tempdir.join(name)
    }

    async fn apply(&self, inventory: &KeyInventory) -> Result<Vec<Change>> {
        let mut applied = Vec::new();

        for (change, payload) in plan(inventory) {
            let path = self.path_of(&change.name);
            match change.kind {
                ChangeKind::Delete => {
                    info!(file = %change.name, "Deleting file");
                    if let Err(e) = self.fs.remove_file(&path).await {
                        error!(file = %change.name, error = %e, "Failed to delete file");
                        return Err(Error::io("deleting", &path, e));
                    }
                }
                ChangeKind::Upsert => {
                    info!(file = %change.name, "Writing file");
                    if let Err(e) = self.fs.write_file(&path, &payload.content).await {
                        error!(file = %change.name, error = %e, "Failed to write file");
                        return Err(Error::io("writing", &path, e));
                    }
                }
            }
            applied.push(change);
        }

        Ok(applied)
    }
}

/// A username usable as a single file name inside the key directory.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\0'])
}

#[async_trait]
impl<F: Filesystem, U: UserSource> Integration for KeyDirectory<F, U> {
    type Payload = UserFiles;
    type Config = User;

    fn name(&self) -> &str {
        "keysync"
    }

    async fn setup(&self) -> Result<()> {
        info!(dir = %self.tempdir.display(), "Setting up key directory");
        self.fs
            .create_dir_all(&self.tempdir)
            .await
            .map_err(|e| Error::io("creating key directory", &self.tempdir, e))
    }

    async fn current_state(&self, ctx: &CycleContext, inventory: &mut KeyInventory) -> Result<()> {
        async {
            info!("Getting current state");

            let names = self
                .fs
                .list_dir(&self.tempdir)
                .await
                .map_err(|e| Error::io("reading key directory", &self.tempdir, e))?;

            for name in names {
                let path = self.path_of(&name);
                debug!(file = %path.display(), "Found file");
                let content = self
                    .fs
                    .read_file(&path)
                    .await
                    .map_err(|e| Error::io("reading file", &path, e))?;

                inventory.insert_current(name.clone(), UserFiles { name, content });
            }

            Ok(())
        }
        .instrument(ctx.span.clone())
        .await
    }

    async fn desired_state(&self, ctx: &CycleContext, inventory: &mut KeyInventory) -> Result<()> {
        async {
            info!("Getting desired state");

            let users = self
                .users
                .fetch_users(&ctx.cancel)
                .await
                .map_err(|e| match e {
                    FetchError::Cancelled => Error::Cancelled,
                    e => Error::RemoteFetch(e),
                })?;

            for user in users {
                if !is_safe_file_name(&user.org_username) {
                    warn!(user = %user.org_username, "Skipping user with unusable name");
                    continue;
                }
                let desired = UserFiles {
                    name: user.org_username.clone(),
                    content: user.gpg_key().as_bytes().to_vec(),
                };
                inventory.insert_desired(user.org_username.clone(), desired, user);
            }

            Ok(())
        }
        .instrument(ctx.span.clone())
        .await
    }

    async fn reconcile(&self, ctx: &CycleContext, inventory: &KeyInventory) -> Result<Vec<Change>> {
        async {
            info!("Reconciling");
            self.apply(inventory).await
        }
        .instrument(ctx.span.clone())
        .await
    }

    fn log_diff(&self, ctx: &CycleContext, inventory: &KeyInventory) -> Vec<Change> {
        let _enter = ctx.span.enter();
        debug!("Logging diff");

        let changes = diff(inventory);
        for change in &changes {
            match change.kind {
                ChangeKind::Delete => info!(file = %change.name, "Deleting"),
                ChangeKind::Upsert => info!(file = %change.name, "Updating"),
            }
        }
        changes
    }
}
