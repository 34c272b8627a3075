#![forbid(unsafe_code)]

mod builds;
mod fake;
mod local;
mod path;
mod retry;
mod store;

pub use builds::{list_builds, Build};
pub use fake::{FakeStore, UploadRecord};
pub use local::LocalStore;
pub use path::{Path, PathError};
pub use retry::{BackoffPolicy, RetryPolicy, RetryStore};
pub use store::{ObjectEntry, ObjectStore, StoreError, StoreErrorCode};

pub const CRATE_NAME: &str = "gridfold-store";
