//! keysync: keeps a directory of user public GPG keys in sync with a remote
//! user directory.
//!
//! Every cycle:
//! - reads the key directory into the inventory as current state
//! - queries the user directory into the inventory as desired state
//! - writes changed or new keys and deletes keys of removed users
//!   (or only logs those changes in dry-run mode)

pub mod clients;
pub mod config;
pub mod error;
pub mod inventory;
pub mod reconciler;
pub mod runner;

#[cfg(test)]
mod test_util;

pub use config::{Args, Config, ConfigError};
pub use error::{Error, Result};
pub use inventory::{ResourceInventory, ResourceState};
pub use reconciler::keys::{KeyDirectory, UserFiles};
pub use reconciler::{Change, ChangeKind, CycleContext, Integration};
pub use runner::{CycleReport, Runner, RunnerOptions};
