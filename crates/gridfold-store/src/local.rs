// SPDX-License-Identifier: Apache-2.0

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::path::Path;
use crate::store::{normalize_prefix, ObjectEntry, ObjectStore, StoreError, StoreErrorCode};

/// Filesystem-backed object store: each bucket is a directory under the
/// root. Serves local runs and integration tests; the cloud client plugs
/// in behind the same trait.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn object_path(&self, path: &Path) -> PathBuf {
        self.root.join(path.bucket()).join(path.object())
    }

    fn classify(err: &std::io::Error) -> StoreErrorCode {
        match err.kind() {
            ErrorKind::NotFound => StoreErrorCode::NotFound,
            ErrorKind::PermissionDenied => StoreErrorCode::Permission,
            ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock => {
                StoreErrorCode::Transient
            }
            _ => StoreErrorCode::Io,
        }
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn open(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        let target = self.object_path(path);
        tokio::fs::read(&target)
            .await
            .map_err(|e| StoreError::new(Self::classify(&e), format!("open {path}: {e}")))
    }

    async fn list(&self, path: &Path, delimiter: &str) -> Result<Vec<ObjectEntry>, StoreError> {
        let prefix = normalize_prefix(path.object());
        let dir = self.root.join(path.bucket()).join(&prefix);
        let mut entries = Vec::new();
        if delimiter.is_empty() {
            walk(&dir, &prefix, &mut entries).await?;
        } else {
            let mut reader = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| StoreError::new(Self::classify(&e), format!("list {path}: {e}")))?;
            while let Some(entry) = reader
                .next_entry()
                .await
                .map_err(|e| StoreError::new(Self::classify(&e), format!("list {path}: {e}")))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                let meta = entry
                    .metadata()
                    .await
                    .map_err(|e| StoreError::new(Self::classify(&e), format!("stat {name}: {e}")))?;
                if meta.is_dir() {
                    entries.push(ObjectEntry {
                        name: format!("{prefix}{name}/"),
                        common_prefix: true,
                        updated: None,
                    });
                } else {
                    entries.push(ObjectEntry {
                        name: format!("{prefix}{name}"),
                        common_prefix: false,
                        updated: meta.modified().ok(),
                    });
                }
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn upload(
        &self,
        path: &Path,
        bytes: &[u8],
        _world_readable: bool,
        _cache_control: &str,
    ) -> Result<(), StoreError> {
        let target = self.object_path(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::new(Self::classify(&e), format!("mkdir {path}: {e}")))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| StoreError::new(Self::classify(&e), format!("upload {path}: {e}")))
    }
}

/// Recursive flat listing for the empty-delimiter case.
async fn walk(
    dir: &std::path::Path,
    prefix: &str,
    out: &mut Vec<ObjectEntry>,
) -> Result<(), StoreError> {
    let mut stack = vec![(dir.to_path_buf(), prefix.to_string())];
    while let Some((dir, prefix)) = stack.pop() {
        let mut reader = tokio::fs::read_dir(&dir).await.map_err(|e| {
            StoreError::new(LocalStore::classify(&e), format!("list {prefix}: {e}"))
        })?;
        while let Some(entry) = reader.next_entry().await.map_err(|e| {
            StoreError::new(LocalStore::classify(&e), format!("list {prefix}: {e}"))
        })? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let meta = entry.metadata().await.map_err(|e| {
                StoreError::new(LocalStore::classify(&e), format!("stat {name}: {e}"))
            })?;
            if meta.is_dir() {
                stack.push((entry.path(), format!("{prefix}{name}/")));
            } else {
                out.push(ObjectEntry {
                    name: format!("{prefix}{name}"),
                    common_prefix: false,
                    updated: meta.modified().ok(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(root: &std::path::Path) -> LocalStore {
        LocalStore::new(root.to_path_buf())
    }

    #[tokio::test]
    async fn open_after_upload_round_trips() {
        let root = tempfile::tempdir().expect("tempdir");
        let s = store(root.path());
        let p = Path::from_url("gs://bucket/dir/obj").expect("path");
        s.upload(&p, b"payload", false, "no-cache").await.expect("upload");
        assert_eq!(s.open(&p).await.expect("open"), b"payload");
    }

    #[tokio::test]
    async fn open_missing_is_not_found() {
        let root = tempfile::tempdir().expect("tempdir");
        let s = store(root.path());
        let p = Path::from_url("gs://bucket/missing").expect("path");
        let err = s.open(&p).await.expect_err("missing object");
        assert_eq!(err.code, StoreErrorCode::NotFound);
    }

    #[tokio::test]
    async fn delimited_list_separates_prefixes_from_objects() {
        let root = tempfile::tempdir().expect("tempdir");
        let s = store(root.path());
        for obj in ["logs/g/1/started.json", "logs/g/2/started.json", "logs/g/latest"] {
            let p = Path::from_url(&format!("gs://bucket/{obj}")).expect("path");
            s.upload(&p, b"{}", false, "").await.expect("upload");
        }
        let listed = s
            .list(&Path::from_url("gs://bucket/logs/g").expect("path"), "/")
            .await
            .expect("list");
        let prefixes: Vec<&str> = listed
            .iter()
            .filter(|e| e.common_prefix)
            .map(|e| e.name.as_str())
            .collect();
        let objects: Vec<&str> = listed
            .iter()
            .filter(|e| !e.common_prefix)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(prefixes, vec!["logs/g/1/", "logs/g/2/"]);
        assert_eq!(objects, vec!["logs/g/latest"]);
    }

    #[tokio::test]
    async fn empty_delimiter_walks_recursively() {
        let root = tempfile::tempdir().expect("tempdir");
        let s = store(root.path());
        for obj in ["logs/g/1/a", "logs/g/1/deep/b"] {
            let p = Path::from_url(&format!("gs://bucket/{obj}")).expect("path");
            s.upload(&p, b"x", false, "").await.expect("upload");
        }
        let listed = s
            .list(&Path::from_url("gs://bucket/logs/g").expect("path"), "")
            .await
            .expect("list");
        let names: Vec<&str> = listed.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["logs/g/1/a", "logs/g/1/deep/b"]);
    }
}
