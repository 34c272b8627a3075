// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::path::Path;
use crate::store::{normalize_prefix, ObjectEntry, ObjectStore, StoreError, StoreErrorCode};

/// In-memory object store for tests.
///
/// Objects key on `bucket/object`; failures and per-open delays are
/// injectable per key.
#[derive(Default)]
pub struct FakeStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    uploads: Mutex<Vec<UploadRecord>>,
    open_failures: Mutex<HashMap<String, StoreErrorCode>>,
    open_delays: Mutex<HashMap<String, Duration>>,
    list_failures: Mutex<HashMap<String, StoreErrorCode>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub path: String,
    pub bytes: Vec<u8>,
    pub world_readable: bool,
    pub cache_control: String,
}

fn key(path: &Path) -> String {
    format!("{}/{}", path.bucket(), path.object())
}

impl FakeStore {
    pub async fn put(&self, url: &str, bytes: &[u8]) {
        let path = Path::from_url(url).expect("fake object url");
        self.objects.lock().await.insert(key(&path), bytes.to_vec());
    }

    pub async fn fail_open(&self, url: &str, code: StoreErrorCode) {
        let path = Path::from_url(url).expect("fake object url");
        self.open_failures.lock().await.insert(key(&path), code);
    }

    pub async fn delay_open(&self, url: &str, delay: Duration) {
        let path = Path::from_url(url).expect("fake object url");
        self.open_delays.lock().await.insert(key(&path), delay);
    }

    pub async fn fail_list(&self, url: &str, code: StoreErrorCode) {
        let path = Path::from_url(url).expect("fake object url");
        self.list_failures.lock().await.insert(key(&path), code);
    }

    pub async fn uploads(&self) -> Vec<UploadRecord> {
        self.uploads.lock().await.clone()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn open(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        let k = key(path);
        if let Some(delay) = self.open_delays.lock().await.get(&k).copied() {
            tokio::time::sleep(delay).await;
        }
        if let Some(code) = self.open_failures.lock().await.get(&k).copied() {
            return Err(StoreError::new(code, format!("injected failure for {k}")));
        }
        self.objects
            .lock()
            .await
            .get(&k)
            .cloned()
            .ok_or_else(|| StoreError::new(StoreErrorCode::NotFound, format!("no object {k}")))
    }

    async fn list(&self, path: &Path, delimiter: &str) -> Result<Vec<ObjectEntry>, StoreError> {
        if let Some(code) = self.list_failures.lock().await.get(&key(path)).copied() {
            return Err(StoreError::new(
                code,
                format!("injected list failure for {path}"),
            ));
        }
        let prefix = format!("{}/{}", path.bucket(), normalize_prefix(path.object()));
        let strip = format!("{}/", path.bucket());
        let objects = self.objects.lock().await;
        let mut out = Vec::new();
        let mut prefixes = BTreeSet::new();
        for name in objects.keys() {
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };
            if delimiter.is_empty() {
                out.push(ObjectEntry {
                    name: name[strip.len()..].to_string(),
                    common_prefix: false,
                    updated: None,
                });
            } else if let Some((first, _)) = rest.split_once(delimiter) {
                prefixes.insert(format!(
                    "{}{first}{delimiter}",
                    &prefix[strip.len()..]
                ));
            } else {
                out.push(ObjectEntry {
                    name: name[strip.len()..].to_string(),
                    common_prefix: false,
                    updated: None,
                });
            }
        }
        for p in prefixes {
            out.push(ObjectEntry {
                name: p,
                common_prefix: true,
                updated: None,
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn upload(
        &self,
        path: &Path,
        bytes: &[u8],
        world_readable: bool,
        cache_control: &str,
    ) -> Result<(), StoreError> {
        self.objects.lock().await.insert(key(path), bytes.to_vec());
        self.uploads.lock().await.push(UploadRecord {
            path: path.to_string(),
            bytes: bytes.to_vec(),
            world_readable,
            cache_control: cache_control.to_string(),
        });
        Ok(())
    }
}
