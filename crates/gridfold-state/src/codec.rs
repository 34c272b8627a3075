// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use gridfold_core::natural_cmp;
use prost::Message;

use crate::result::result_iter;
use crate::state::{Grid, TestResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError(pub String);

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CodecError {}

/// Serializes a grid into zlib-compressed proto bytes.
pub fn marshal(grid: &Grid) -> Result<Vec<u8>, CodecError> {
    let raw = grid.encode_to_vec();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&raw)
        .map_err(|e| CodecError(format!("compress: {e}")))?;
    encoder
        .finish()
        .map_err(|e| CodecError(format!("close: {e}")))
}

/// Inverse of [`marshal`]: decompress then decode.
pub fn unmarshal(bytes: &[u8]) -> Result<Grid, CodecError> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| CodecError(format!("decompress: {e}")))?;
    Grid::decode(raw.as_slice()).map_err(|e| CodecError(format!("decode: {e}")))
}

/// Checks the structural grid invariants.
///
/// Intended for tests and debug assertions; production encoding keeps
/// these by construction.
pub fn validate(grid: &Grid) -> Result<(), CodecError> {
    let cols = grid.columns.len();
    for pair in grid.columns.windows(2) {
        if pair[0].started < pair[1].started {
            return Err(CodecError(format!(
                "columns out of order: {} started before {}",
                pair[0].build, pair[1].build
            )));
        }
    }
    for pair in grid.rows.windows(2) {
        if natural_cmp(&pair[0].name, &pair[1].name) == std::cmp::Ordering::Greater {
            return Err(CodecError(format!(
                "rows out of order: {:?} before {:?}",
                pair[0].name, pair[1].name
            )));
        }
    }
    for row in &grid.rows {
        if row.results.len() % 2 != 0 {
            return Err(CodecError(format!(
                "row {:?}: odd result stream",
                row.name
            )));
        }
        let decoded: i64 = row.results.chunks(2).map(|p| i64::from(p[1])).sum();
        if decoded != cols as i64 {
            return Err(CodecError(format!(
                "row {:?}: decoded result length {decoded} != {cols} columns",
                row.name
            )));
        }
        if row.cell_ids.len() != cols || row.messages.len() != cols || row.icons.len() != cols {
            return Err(CodecError(format!(
                "row {:?}: side arrays {}/{}/{} != {cols} columns",
                row.name,
                row.cell_ids.len(),
                row.messages.len(),
                row.icons.len()
            )));
        }
        if row.metric.len() != row.metrics.len() {
            return Err(CodecError(format!(
                "row {:?}: metric names and series disagree",
                row.name
            )));
        }
        for (name, metric) in row.metric.iter().zip(&row.metrics) {
            if *name != metric.name {
                return Err(CodecError(format!(
                    "row {:?}: metric {:?} paired with series {:?}",
                    row.name, name, metric.name
                )));
            }
            validate_metric(&row.name, metric, cols)?;
        }
        let occupied: Vec<bool> = result_iter(&row.results)
            .take(cols)
            .map(|raw| raw != TestResult::NoResult as i32)
            .collect();
        for metric in &row.metrics {
            for pair in metric.indices.chunks(2) {
                let (start, len) = (pair[0], pair[1]);
                for idx in start..start + len {
                    if !occupied.get(idx as usize).copied().unwrap_or(false) {
                        return Err(CodecError(format!(
                            "row {:?}: metric {:?} index {idx} names a no-result cell",
                            row.name, metric.name
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

fn validate_metric(
    row: &str,
    metric: &crate::state::Metric,
    cols: usize,
) -> Result<(), CodecError> {
    if metric.indices.len() % 2 != 0 {
        return Err(CodecError(format!(
            "row {row:?}: metric {:?} has odd index stream",
            metric.name
        )));
    }
    let mut total = 0i64;
    let mut prev_end: Option<i32> = None;
    for pair in metric.indices.chunks(2) {
        let (start, len) = (pair[0], pair[1]);
        if start < 0 || len <= 0 || (start + len) as usize > cols {
            return Err(CodecError(format!(
                "row {row:?}: metric {:?} run ({start}, {len}) outside {cols} columns",
                metric.name
            )));
        }
        if let Some(end) = prev_end {
            if start <= end {
                return Err(CodecError(format!(
                    "row {row:?}: metric {:?} run at {start} overlaps previous end {end}",
                    metric.name
                )));
            }
        }
        prev_end = Some(start + len - 1);
        total += i64::from(len);
    }
    if total != metric.values.len() as i64 {
        return Err(CodecError(format!(
            "row {row:?}: metric {:?} runs cover {total} cells but holds {} values",
            metric.name,
            metric.values.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Column, Metric, Row};

    fn sample_grid() -> Grid {
        Grid {
            columns: vec![
                Column {
                    build: "12".to_string(),
                    started: 2000.5,
                    extra: vec!["12".to_string()],
                    hint: "deadbeef".to_string(),
                },
                Column {
                    build: "11".to_string(),
                    started: 1000.0,
                    extra: vec!["11".to_string()],
                    hint: String::new(),
                },
            ],
            rows: vec![Row {
                name: "t1".to_string(),
                id: "t1".to_string(),
                results: vec![TestResult::Pass as i32, 2],
                cell_ids: vec!["12".to_string(), "11".to_string()],
                messages: vec![String::new(), String::new()],
                icons: vec![String::new(), String::new()],
                metric: vec!["latency".to_string()],
                metrics: vec![Metric {
                    name: "latency".to_string(),
                    indices: vec![0, 2],
                    values: vec![12.5, 13.0],
                }],
                alert_info: None,
            }],
        }
    }

    #[test]
    fn round_trip_is_identity() {
        let grid = sample_grid();
        let bytes = marshal(&grid).expect("marshal");
        let decoded = unmarshal(&bytes).expect("unmarshal");
        assert_eq!(grid, decoded);
    }

    #[test]
    fn marshal_is_deterministic() {
        let grid = sample_grid();
        assert_eq!(marshal(&grid).expect("a"), marshal(&grid).expect("b"));
    }

    #[test]
    fn payload_is_zlib_framed() {
        let bytes = marshal(&sample_grid()).expect("marshal");
        // RFC 1950: deflate with 32k window starts 0x78.
        assert_eq!(bytes[0], 0x78);
    }

    #[test]
    fn validate_accepts_sample() {
        validate(&sample_grid()).expect("valid grid");
    }

    #[test]
    fn validate_rejects_short_results() {
        let mut grid = sample_grid();
        grid.rows[0].results = vec![TestResult::Pass as i32, 1];
        assert!(validate(&grid).is_err());
    }

    #[test]
    fn validate_rejects_unsorted_columns() {
        let mut grid = sample_grid();
        grid.columns.swap(0, 1);
        assert!(validate(&grid).is_err());
    }

    #[test]
    fn validate_rejects_metric_value_mismatch() {
        let mut grid = sample_grid();
        grid.rows[0].metrics[0].values.pop();
        assert!(validate(&grid).is_err());
    }

    #[test]
    fn validate_rejects_metric_over_no_result() {
        let mut grid = sample_grid();
        grid.rows[0].results = vec![
            TestResult::Pass as i32,
            1,
            TestResult::NoResult as i32,
            1,
        ];
        assert!(validate(&grid).is_err());
    }
}
