// SPDX-License-Identifier: Apache-2.0

//! Grid assembly: folds ordered columns into RLE rows and sparse metrics.

use std::collections::BTreeMap;

use gridfold_core::natural_cmp;
use gridfold_model::TestGroup;
use gridfold_state::{Grid, Metric, Row, TestResult};

use crate::alert::alert_row;
use crate::errors::UpdateError;
use crate::read::{Cell, InflatedColumn};

/// Folds the ordered column sequence into a grid.
///
/// Rows and per-row metric lists come out sorted in natural order, and
/// every row is annotated with its alert state when the group enables
/// alerts.
pub fn construct_grid(group: &TestGroup, cols: Vec<InflatedColumn>) -> Result<Grid, UpdateError> {
    let mut grid = Grid::default();
    let mut rows: BTreeMap<String, usize> = BTreeMap::new();
    for col in cols {
        append_column(&mut grid, &mut rows, col)?;
    }
    grid.rows.sort_by(|a, b| natural_cmp(&a.name, &b.name));
    for row in &mut grid.rows {
        row.metric.sort_by(|a, b| natural_cmp(a, b));
        row.metrics.sort_by(|a, b| natural_cmp(&a.name, &b.name));
    }

    if let Some(policy) = group.alert_policy() {
        let Grid { columns, rows, .. } = &mut grid;
        for row in rows.iter_mut() {
            row.alert_info = alert_row(
                columns,
                row,
                policy.failures_to_open,
                policy.passes_to_close,
            );
        }
    }
    Ok(grid)
}

/// Appends one inflated column to the grid.
///
/// Rows appearing mid-run are back-filled with empty cells; rows absent
/// from this column receive one empty cell.
fn append_column(
    grid: &mut Grid,
    rows: &mut BTreeMap<String, usize>,
    inflated: InflatedColumn,
) -> Result<(), UpdateError> {
    grid.columns.push(inflated.column);

    let mut missing: Vec<usize> = rows.values().copied().collect();
    let empty = Cell::no_result();
    for (name, cell) in inflated.cells {
        let idx = match rows.get(&name) {
            Some(&idx) => {
                missing.retain(|&m| m != idx);
                idx
            }
            None => {
                let idx = grid.rows.len();
                grid.rows.push(Row {
                    name: name.clone(),
                    id: name.clone(),
                    ..Row::default()
                });
                rows.insert(name, idx);
                let n = grid.columns.len();
                if n > 1 {
                    append_cell(&mut grid.rows[idx], &empty, n - 1)?;
                }
                idx
            }
        };
        append_cell(&mut grid.rows[idx], &cell, 1)?;
    }

    for idx in missing {
        append_cell(&mut grid.rows[idx], &empty, 1)?;
    }
    Ok(())
}

/// Appends `count` copies of a cell to a row.
///
/// Run-length-encodes the result stream and keeps the side arrays dense:
/// `NO_RESULT` cells contribute cell ids and empty message/icon strings
/// but never metric samples.
fn append_cell(row: &mut Row, cell: &Cell, count: usize) -> Result<(), UpdateError> {
    let code = cell.result as i32;
    let n = row.results.len();
    if n == 0 || row.results[n - 2] != code {
        row.results.push(code);
        row.results.push(count as i32);
    } else {
        row.results[n - 1] += count as i32;
    }

    for _ in 0..count {
        row.cell_ids.push(cell.cell_id.clone());
        if cell.result == TestResult::NoResult {
            row.messages.push(String::new());
            row.icons.push(String::new());
            continue;
        }
        let col_idx = (row.cell_ids.len() - 1) as i32;
        let row_name = row.name.clone();
        for (metric_name, value) in &cell.metrics {
            let metric = row_metric(row, metric_name);
            append_metric(&row_name, metric, col_idx, *value)?;
        }
        row.messages.push(cell.message.clone());
        row.icons.push(cell.icon.clone());
    }
    Ok(())
}

/// Finds or creates the named metric series on a row.
fn row_metric<'a>(row: &'a mut Row, name: &str) -> &'a mut Metric {
    if !row.metric.iter().any(|m| m == name) {
        row.metric.push(name.to_string());
    }
    let pos = match row.metrics.iter().position(|m| m.name == name) {
        Some(pos) => pos,
        None => {
            row.metrics.push(Metric {
                name: name.to_string(),
                indices: Vec::new(),
                values: Vec::new(),
            });
            row.metrics.len() - 1
        }
    };
    &mut row.metrics[pos]
}

/// Adds one sample at `idx`, sparse-encoding the index stream.
///
/// Indices must be monotonically increasing per metric; a violation is a
/// programmer error and aborts the group.
fn append_metric(row: &str, metric: &mut Metric, idx: i32, value: f64) -> Result<(), UpdateError> {
    let l = metric.indices.len();
    if l == 0 || metric.indices[l - 2] + metric.indices[l - 1] != idx {
        if l > 0 && idx < metric.indices[l - 2] + metric.indices[l - 1] {
            return Err(UpdateError::internal(format!(
                "row {row:?}: metric {:?} index {idx} is not monotonically increasing",
                metric.name
            )));
        }
        metric.indices.push(idx);
        metric.indices.push(1);
    } else {
        metric.indices[l - 1] += 1;
    }
    metric.values.push(value);
    Ok(())
}
