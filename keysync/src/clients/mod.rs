//! Capabilities the reconciler reaches the outside world through.
//!
//! - `fs`: the local key directory (list, read, write, remove, mkdir)
//! - `users`: the remote user directory (GraphQL)

pub mod fs;
pub mod users;

pub use fs::{Filesystem, LocalFs};
pub use users::{FetchError, GraphqlUserSource, User, UserSource};
