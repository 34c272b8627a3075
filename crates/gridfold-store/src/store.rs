// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};
use std::time::SystemTime;

use async_trait::async_trait;

use crate::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    NotFound,
    Permission,
    Transient,
    Io,
    Validation,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Permission => "permission",
            Self::Transient => "transient",
            Self::Io => "io_error",
            Self::Validation => "validation_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.code == StoreErrorCode::Transient
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

/// One listing entry: either an object or a common prefix
/// (a "subdirectory" under the listed prefix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Full object name, or the common prefix ending in the delimiter.
    pub name: String,
    pub common_prefix: bool,
    pub updated: Option<SystemTime>,
}

/// Uniform read / list / upload over a bucket+object namespace.
///
/// The production client wraps the cloud SDK behind this seam; tests and
/// local runs use [`crate::LocalStore`] or [`crate::FakeStore`].
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn open(&self, path: &Path) -> Result<Vec<u8>, StoreError>;

    /// Lists entries under `path`, delimited like a directory listing.
    ///
    /// A trailing slash is appended to the prefix if missing so the
    /// prefix names a directory. An empty delimiter lists every object
    /// under the prefix recursively.
    async fn list(&self, path: &Path, delimiter: &str) -> Result<Vec<ObjectEntry>, StoreError>;

    async fn upload(
        &self,
        path: &Path,
        bytes: &[u8],
        world_readable: bool,
        cache_control: &str,
    ) -> Result<(), StoreError>;
}

/// Directory-normalized object prefix: ensures one trailing slash.
#[must_use]
pub(crate) fn normalize_prefix(object: &str) -> String {
    if object.is_empty() || object.ends_with('/') {
        object.to_string()
    } else {
        format!("{object}/")
    }
}
