// SPDX-License-Identifier: Apache-2.0

//! Top-level group driver.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gridfold_model::{Config, TestGroup};
use gridfold_state::marshal;
use gridfold_store::{list_builds, ObjectStore, Path};
use tokio::sync::mpsc;

use crate::columns::read_columns;
use crate::errors::UpdateError;
use crate::grid::construct_grid;
use crate::progress::spawn_progress;

/// Core cap on columns per grid.
pub const MAX_COLUMNS: usize = 50;

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub config_path: Path,
    /// Object prefix for grids, resolved relative to the config path.
    pub grid_prefix: String,
    /// Restrict the run to one named group.
    pub group: Option<String>,
    pub group_concurrency: usize,
    pub build_concurrency: usize,
    /// When false, everything runs except the upload.
    pub confirm: bool,
    pub group_timeout: Duration,
    pub build_timeout: Duration,
}

/// Runs one full update pass over every configured group.
///
/// Configuration failures and a missing named group are the only fatal
/// errors; per-group failures are logged and the pass completes.
pub async fn update(store: Arc<dyn ObjectStore>, opts: UpdateOptions) -> Result<(), UpdateError> {
    let bytes = store.open(&opts.config_path).await.map_err(|e| {
        UpdateError::config(format!("read config {}: {e}", opts.config_path))
    })?;
    let cfg = Config::from_slice(&bytes).map_err(|e| UpdateError::config(e.to_string()))?;
    tracing::info!(
        config = %opts.config_path,
        groups = cfg.test_groups.len(),
        "updating test groups"
    );

    let selected: Vec<TestGroup> = match &opts.group {
        Some(name) => {
            let tg = cfg
                .find_test_group(name)
                .cloned()
                .ok_or_else(|| UpdateError::config(format!("group {name:?} not found")))?;
            vec![tg]
        }
        None => cfg.test_groups,
    };
    let total = selected.len();

    let (tx, rx) = mpsc::channel::<TestGroup>(1);
    let rx = Arc::new(tokio::sync::Mutex::new(rx));
    let opts = Arc::new(opts);
    let mut workers = Vec::new();
    for _ in 0..opts.group_concurrency.max(1) {
        let rx = Arc::clone(&rx);
        let store = Arc::clone(&store);
        let opts = Arc::clone(&opts);
        workers.push(tokio::spawn(async move {
            loop {
                let next = { rx.lock().await.recv().await };
                let Some(tg) = next else { break };
                let group = tg.name.clone();
                if let Err(err) = run_group(Arc::clone(&store), &opts, tg).await {
                    tracing::error!(group = %group, error = %err, "error updating group");
                }
            }
        }));
    }

    let (progress_tx, progress_rx) = mpsc::channel::<usize>(1);
    let reporter = spawn_progress(progress_rx, total, "update in progress");

    for (index, tg) in selected.into_iter().enumerate() {
        let _ = progress_tx.try_send(index);
        if tx.send(tg).await.is_err() {
            break;
        }
    }
    drop(tx);
    drop(progress_tx);
    for worker in workers {
        let _ = worker.await;
    }
    let _ = reporter.await;
    Ok(())
}

/// Resolves the grid location and runs one group under its deadline.
async fn run_group(
    store: Arc<dyn ObjectStore>,
    opts: &UpdateOptions,
    tg: TestGroup,
) -> Result<(), UpdateError> {
    let location = if opts.grid_prefix.is_empty() {
        tg.name.clone()
    } else {
        format!("{}/{}", opts.grid_prefix.trim_end_matches('/'), tg.name)
    };
    let grid_path = opts
        .config_path
        .resolve(&location)
        .map_err(|e| UpdateError::config(format!("grid path: {e}")))?;
    match tokio::time::timeout(
        opts.group_timeout,
        update_group(store, opts, &tg, &grid_path),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(UpdateError::deadline(format!(
            "group timed out after {:?}",
            opts.group_timeout
        ))),
    }
}

async fn update_group(
    store: Arc<dyn ObjectStore>,
    opts: &UpdateOptions,
    tg: &TestGroup,
    grid_path: &Path,
) -> Result<(), UpdateError> {
    let prefix = Path::from_prefix(&tg.prefix)
        .map_err(|e| UpdateError::config(format!("group prefix: {e}")))?;
    let builds = list_builds(store.as_ref(), &prefix)
        .await
        .map_err(|e| UpdateError::transient(format!("list builds: {e}")))?;
    tracing::debug!(group = %tg.name, total = builds.len(), "listed builds");

    let stop = epoch_seconds(SystemTime::now()) - tg.retention().as_secs_f64();
    let cols = read_columns(
        Arc::clone(&store),
        tg,
        builds,
        stop,
        MAX_COLUMNS,
        opts.build_timeout,
        opts.build_concurrency,
    )
    .await?;

    let grid = construct_grid(tg, cols)?;
    let buf =
        marshal(&grid).map_err(|e| UpdateError::internal(format!("marshal grid: {e}")))?;
    if opts.confirm {
        store
            .upload(grid_path, &buf, tg.world_readable, "no-cache")
            .await
            .map_err(|e| UpdateError::transient(format!("upload: {e}")))?;
    } else {
        tracing::debug!(group = %tg.name, url = %grid_path, "skipping write");
    }
    tracing::info!(
        group = %tg.name,
        url = %grid_path,
        cols = grid.columns.len(),
        rows = grid.rows.len(),
        bytes = buf.len(),
        "wrote grid"
    );
    Ok(())
}

fn epoch_seconds(t: SystemTime) -> f64 {
    t.duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64())
}
