// SPDX-License-Identifier: Apache-2.0

//! Bounded-parallel column reading with ordered collection.

use std::sync::Arc;
use std::time::Duration;

use gridfold_model::{NameTemplate, TestGroup};
use gridfold_store::{Build, ObjectStore};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::errors::UpdateError;
use crate::read::{read_build, InflatedColumn};

/// Reads builds into columns, newest first.
///
/// Dispatches up to `concurrency` reads at a time and reassembles the
/// output in dispatch order, so the column sequence stays monotonically
/// non-increasing in `started` regardless of completion order. Stops
/// once a column is older than `stop` or `max_cols` columns are
/// collected; failed builds drop their column and the fold continues.
pub async fn read_columns(
    store: Arc<dyn ObjectStore>,
    group: &TestGroup,
    builds: Vec<Build>,
    stop: f64,
    max_cols: usize,
    build_timeout: Duration,
    concurrency: usize,
) -> Result<Vec<InflatedColumn>, UpdateError> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let template = group
        .name_template
        .clone()
        .unwrap_or_else(NameTemplate::default);

    let mut handles = Vec::with_capacity(builds.len());
    for build in builds {
        let store = Arc::clone(&store);
        let semaphore = Arc::clone(&semaphore);
        let template = template.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| UpdateError::internal("build pool closed"))?;
            match tokio::time::timeout(
                build_timeout,
                read_build(store.as_ref(), &build, &template),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(UpdateError::deadline(format!(
                    "build {} timed out after {build_timeout:?}",
                    build.name
                ))),
            }
        }));
    }

    let mut tasks = BuildTasks { handles };
    let mut cols = Vec::new();
    for i in 0..tasks.handles.len() {
        match (&mut tasks.handles[i]).await {
            Ok(Ok(col)) => {
                let started = col.column.started;
                cols.push(col);
                if started < stop {
                    tracing::debug!(group = %group.name, started, stop, "reached the retention boundary");
                    break;
                }
                if cols.len() >= max_cols {
                    tracing::debug!(group = %group.name, max_cols, "reached the column cap");
                    break;
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(group = %group.name, error = %err, "dropping column");
            }
            Err(err) => {
                tracing::warn!(group = %group.name, error = %err, "build task died, dropping column");
            }
        }
    }
    Ok(cols)
}

/// Dispatched build reads; outstanding tasks abort when this drops, on
/// early stop and on group-deadline cancellation alike.
struct BuildTasks {
    handles: Vec<JoinHandle<Result<InflatedColumn, UpdateError>>>,
}

impl Drop for BuildTasks {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
