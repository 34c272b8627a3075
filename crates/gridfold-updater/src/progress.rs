// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Linear ETA extrapolation from completed work.
#[must_use]
pub(crate) fn eta(elapsed: Duration, current: usize, total: usize) -> Duration {
    if current == 0 {
        return Duration::ZERO;
    }
    let rate = elapsed / current as u32;
    rate * total.saturating_sub(current) as u32
}

/// Logs progress once a minute until the sender closes.
///
/// The feeding side uses `try_send`, dropping updates when this reader
/// is busy; only the freshest index matters.
pub(crate) fn spawn_progress(
    mut rx: mpsc::Receiver<usize>,
    total: usize,
    message: &'static str,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = Instant::now();
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        interval.tick().await;
        let mut current = 0usize;
        loop {
            tokio::select! {
                update = rx.recv() => match update {
                    Some(index) => current = index,
                    None => return,
                },
                _ = interval.tick() => {
                    if current == 0 || total == 0 {
                        continue;
                    }
                    let remain = eta(start.elapsed(), current, total);
                    tracing::info!(
                        current,
                        total,
                        percent = 100 * current / total,
                        remain_secs = remain.as_secs(),
                        "{message}"
                    );
                }
            }
        }
    })
}
