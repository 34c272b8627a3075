// SPDX-License-Identifier: Apache-2.0

//! Per-row alert evaluation.

use gridfold_state::{coalesce, result_iter, AlertInfo, Column, Row, TestResult, Timestamp};

/// Returns an alert when a row shows `failures_to_open` consecutive
/// failures more recently than `passes_to_close` consecutive passes.
///
/// Walks columns newest-first against the RLE-decoded results. `RUNNING`
/// cells do not decide the alert but still consume a compressed index
/// slot.
#[must_use]
pub fn alert_row(
    cols: &[Column],
    row: &Row,
    failures_to_open: usize,
    passes_to_close: usize,
) -> Option<AlertInfo> {
    if failures_to_open == 0 {
        return None;
    }
    let mut failures = 0usize;
    let mut total_failures = 0i32;
    let mut passes = 0usize;
    let mut compressed_idx = 0usize;
    let mut last_fail: Option<&Column> = None;
    let mut latest_pass: Option<&Column> = None;
    let mut fail_idx = 0usize;
    let mut results = result_iter(&row.results);

    for col in cols {
        let raw = results.next().unwrap_or(TestResult::NoResult as i32);
        let res = coalesce(raw, true);
        if res == TestResult::NoResult {
            if raw == TestResult::Running as i32 {
                compressed_idx += 1;
            }
            continue;
        }
        if res == TestResult::Pass {
            passes += 1;
            if failures >= failures_to_open {
                // Most recent pass bounding the outage.
                latest_pass = Some(col);
                break;
            }
            if passes >= passes_to_close {
                return None;
            }
            failures = 0;
        }
        if res == TestResult::Fail {
            passes = 0;
            failures += 1;
            total_failures += 1;
            if failures == 1 {
                // Most recent failure of this streak.
                fail_idx = compressed_idx;
                last_fail = Some(col);
            }
        }
        if res == TestResult::Flaky {
            passes = 0;
            if failures >= failures_to_open {
                // Cannot say which commit is at fault.
                break;
            }
            failures = 0;
        }
        compressed_idx += 1;
    }

    if failures < failures_to_open {
        return None;
    }
    let message = row.messages.get(fail_idx).cloned().unwrap_or_default();
    let cell_id = row.cell_ids.get(fail_idx).cloned().unwrap_or_default();
    Some(alert_info(
        total_failures,
        message,
        cell_id,
        last_fail,
        latest_pass,
    ))
}

fn alert_info(
    fail_count: i32,
    failure_message: String,
    fail_test_id: String,
    fail: Option<&Column>,
    pass: Option<&Column>,
) -> AlertInfo {
    AlertInfo {
        fail_count,
        fail_build_id: build_id(fail),
        fail_time: stamp(fail),
        fail_test_id,
        failure_message,
        pass_build_id: build_id(pass),
        pass_time: stamp(pass),
    }
}

/// The ID from the first extra column value, or else the build field.
fn build_id(col: Option<&Column>) -> String {
    let Some(col) = col else {
        return String::new();
    };
    col.extra.first().cloned().unwrap_or_else(|| col.build.clone())
}

/// Splits fractional epoch seconds into a timestamp.
fn stamp(col: Option<&Column>) -> Option<Timestamp> {
    let col = col?;
    let floor = col.started.floor();
    Some(Timestamp {
        seconds: floor as i64,
        nanos: ((col.started - floor) * 1e9) as i32,
    })
}
