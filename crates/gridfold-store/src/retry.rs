// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;

use crate::path::Path;
use crate::store::{ObjectEntry, ObjectStore, StoreError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

pub trait BackoffPolicy {
    fn delay_for_attempt(&self, attempt: usize) -> Duration;
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff_ms: 120,
        }
    }
}

impl BackoffPolicy for RetryPolicy {
    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(attempt as u64))
    }
}

/// Wraps a store, retrying transient failures with linear backoff.
///
/// `NotFound` and `Permission` surface immediately.
pub struct RetryStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryStore<S> {
    #[must_use]
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<S> RetryStore<S> {
    async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    tracing::warn!(attempt, error = %err, "{what} failed, retrying");
                    tokio::time::sleep(self.policy.delay_for_attempt(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for RetryStore<S> {
    async fn open(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        self.run("open", || self.inner.open(path)).await
    }

    async fn list(&self, path: &Path, delimiter: &str) -> Result<Vec<ObjectEntry>, StoreError> {
        self.run("list", || self.inner.list(path, delimiter)).await
    }

    async fn upload(
        &self,
        path: &Path,
        bytes: &[u8],
        world_readable: bool,
        cache_control: &str,
    ) -> Result<(), StoreError> {
        self.run("upload", || {
            self.inner.upload(path, bytes, world_readable, cache_control)
        })
        .await
    }
}
