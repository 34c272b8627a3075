// SPDX-License-Identifier: Apache-2.0

//! Build reader: inflates one build's artifacts into a column.

use std::collections::BTreeMap;

use gridfold_model::NameTemplate;
use gridfold_state::{Column, TestResult};
use gridfold_store::{Build, ObjectStore, StoreErrorCode};
use serde::Deserialize;

use crate::errors::UpdateError;

/// One result for one test in one build.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub result: TestResult,
    pub cell_id: String,
    pub message: String,
    pub icon: String,
    pub metrics: BTreeMap<String, f64>,
}

impl Cell {
    #[must_use]
    pub fn no_result() -> Self {
        Self {
            result: TestResult::NoResult,
            cell_id: String::new(),
            message: String::new(),
            icon: String::new(),
            metrics: BTreeMap::new(),
        }
    }
}

/// Pre-assembly representation of a column: header plus cells keyed by
/// canonical row name.
#[derive(Debug, Clone, PartialEq)]
pub struct InflatedColumn {
    pub column: Column,
    pub cells: BTreeMap<String, Cell>,
}

#[derive(Debug, Deserialize)]
struct Started {
    timestamp: Option<f64>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Finished {
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ResultsFile {
    #[serde(default)]
    tests: BTreeMap<String, RawResult>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    status: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    metrics: BTreeMap<String, f64>,
}

/// Reads one build's manifest and results into an [`InflatedColumn`].
///
/// A missing or unparseable start time skips the build; a missing
/// `finished.json` marks the build still running, turning statusless
/// cells into `RUNNING`.
pub async fn read_build(
    store: &dyn ObjectStore,
    build: &Build,
    template: &NameTemplate,
) -> Result<InflatedColumn, UpdateError> {
    let started: Started = read_json(store, build, "started.json", true).await?.ok_or_else(
        || UpdateError::skip(format!("build {}: missing started.json", build.name)),
    )?;
    let Some(started_seconds) = started.timestamp else {
        return Err(UpdateError::skip(format!(
            "build {}: started.json has no timestamp",
            build.name
        )));
    };

    let finished: Option<Finished> = read_json(store, build, "finished.json", false).await?;
    let running = finished.is_none();

    let mut metadata = started.metadata;
    if let Some(finished) = finished {
        metadata.extend(finished.metadata);
    }

    let results: ResultsFile = read_json(store, build, "artifacts/results.json", false)
        .await?
        .unwrap_or(ResultsFile {
            tests: BTreeMap::new(),
        });

    let mut cells: BTreeMap<String, Cell> = BTreeMap::new();
    for (test_name, raw) in results.tests {
        let result = match raw.status.as_deref() {
            Some(status) => parse_status(status),
            None if running => TestResult::Running,
            None => TestResult::Unknown,
        };
        let name = unique_name(&cells, template.render(&test_name, &metadata));
        cells.insert(
            name,
            Cell {
                result,
                cell_id: build.name.clone(),
                message: raw.message,
                icon: raw.icon,
                metrics: raw.metrics,
            },
        );
    }

    let extra = template
        .parts
        .iter()
        .filter(|part| part.as_str() != gridfold_model::TESTS_NAME_PART)
        .map(|part| metadata.get(part).cloned().unwrap_or_else(|| "missing".to_string()))
        .collect();

    Ok(InflatedColumn {
        column: Column {
            build: build.name.clone(),
            started: started_seconds,
            extra,
            hint: metadata
                .get("revision")
                .or_else(|| metadata.get("commit"))
                .cloned()
                .unwrap_or_default(),
        },
        cells,
    })
}

/// Reads and parses one build artifact.
///
/// `required` controls whether `NotFound` is an error or an absent
/// `Ok(None)`; other store failures are transient, parse failures skip
/// the build.
async fn read_json<T: serde::de::DeserializeOwned>(
    store: &dyn ObjectStore,
    build: &Build,
    artifact: &str,
    required: bool,
) -> Result<Option<T>, UpdateError> {
    let path = build.path.join(artifact);
    let bytes = match store.open(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.code == StoreErrorCode::NotFound => {
            if required {
                return Err(UpdateError::skip(format!(
                    "build {}: missing {artifact}",
                    build.name
                )));
            }
            return Ok(None);
        }
        Err(err) => {
            return Err(UpdateError::transient(format!(
                "build {}: read {artifact}: {err}",
                build.name
            )));
        }
    };
    let parsed = serde_json::from_slice(&bytes).map_err(|e| {
        UpdateError::skip(format!("build {}: parse {artifact}: {e}", build.name))
    })?;
    Ok(Some(parsed))
}

/// Disambiguates rendered names that collide within one column.
fn unique_name(cells: &BTreeMap<String, Cell>, rendered: String) -> String {
    if !cells.contains_key(&rendered) {
        return rendered;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{rendered} [{n}]");
        if !cells.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn parse_status(status: &str) -> TestResult {
    match status {
        "NO_RESULT" => TestResult::NoResult,
        "PASS" => TestResult::Pass,
        "PASS_WITH_ERRORS" => TestResult::PassWithErrors,
        "PASS_WITH_SKIPS" => TestResult::PassWithSkips,
        "RUNNING" => TestResult::Running,
        "CATEGORIZED_ABORT" => TestResult::CategorizedAbort,
        "CANCEL" => TestResult::Cancel,
        "BLOCKED" => TestResult::Blocked,
        "TIMED_OUT" => TestResult::TimedOut,
        "CATEGORIZED_FAIL" => TestResult::CategorizedFail,
        "BUILD_FAIL" => TestResult::BuildFail,
        "FAIL" => TestResult::Fail,
        "FLAKY" => TestResult::Flaky,
        _ => TestResult::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfold_store::{FakeStore, Path};

    fn build(name: &str) -> Build {
        Build {
            name: name.to_string(),
            path: Path::from_url(&format!("gs://b/logs/g/{name}")).expect("path"),
            ordinal: name.parse().ok(),
        }
    }

    async fn seed_build(store: &FakeStore, name: &str, started: f64, results: &str) {
        store
            .put(
                &format!("gs://b/logs/g/{name}/started.json"),
                format!("{{\"timestamp\": {started}}}").as_bytes(),
            )
            .await;
        store
            .put(
                &format!("gs://b/logs/g/{name}/finished.json"),
                br#"{"timestamp": 2000, "metadata": {"revision": "abc123"}}"#,
            )
            .await;
        store
            .put(
                &format!("gs://b/logs/g/{name}/artifacts/results.json"),
                results.as_bytes(),
            )
            .await;
    }

    #[tokio::test]
    async fn inflates_a_finished_build() {
        let store = FakeStore::default();
        seed_build(
            &store,
            "7",
            1000.5,
            r#"{"tests": {"t1": {"status": "PASS", "metrics": {"latency": 12.5}}}}"#,
        )
        .await;
        let col = read_build(&store, &build("7"), &NameTemplate::default())
            .await
            .expect("column");
        assert_eq!(col.column.build, "7");
        assert_eq!(col.column.started, 1000.5);
        assert_eq!(col.column.hint, "abc123");
        let cell = col.cells.get("t1").expect("cell");
        assert_eq!(cell.result, TestResult::Pass);
        assert_eq!(cell.cell_id, "7");
        assert_eq!(cell.metrics.get("latency"), Some(&12.5));
    }

    #[tokio::test]
    async fn missing_start_time_skips_the_build() {
        let store = FakeStore::default();
        store
            .put("gs://b/logs/g/7/started.json", b"{\"metadata\": {}}")
            .await;
        let err = read_build(&store, &build("7"), &NameTemplate::default())
            .await
            .expect_err("skip");
        assert_eq!(err.code, crate::UpdateErrorCode::Skip);
    }

    #[tokio::test]
    async fn missing_started_object_skips_the_build() {
        let store = FakeStore::default();
        let err = read_build(&store, &build("7"), &NameTemplate::default())
            .await
            .expect_err("skip");
        assert_eq!(err.code, crate::UpdateErrorCode::Skip);
    }

    #[tokio::test]
    async fn transient_store_failure_is_retriable() {
        let store = FakeStore::default();
        seed_build(&store, "7", 1000.0, "{}").await;
        store
            .fail_open(
                "gs://b/logs/g/7/artifacts/results.json",
                gridfold_store::StoreErrorCode::Transient,
            )
            .await;
        let err = read_build(&store, &build("7"), &NameTemplate::default())
            .await
            .expect_err("transient");
        assert_eq!(err.code, crate::UpdateErrorCode::Transient);
    }

    #[tokio::test]
    async fn malformed_results_skip_the_build() {
        let store = FakeStore::default();
        seed_build(&store, "7", 1000.0, "not json").await;
        let err = read_build(&store, &build("7"), &NameTemplate::default())
            .await
            .expect_err("skip");
        assert_eq!(err.code, crate::UpdateErrorCode::Skip);
    }

    #[tokio::test]
    async fn unfinished_build_marks_statusless_cells_running() {
        let store = FakeStore::default();
        store
            .put("gs://b/logs/g/7/started.json", b"{\"timestamp\": 1000}")
            .await;
        store
            .put(
                "gs://b/logs/g/7/artifacts/results.json",
                br#"{"tests": {"t1": {}}}"#,
            )
            .await;
        let col = read_build(&store, &build("7"), &NameTemplate::default())
            .await
            .expect("column");
        assert_eq!(col.cells["t1"].result, TestResult::Running);
    }

    #[tokio::test]
    async fn template_renders_names_and_extras() {
        let store = FakeStore::default();
        store
            .put("gs://b/logs/g/7/started.json", b"{\"timestamp\": 1000}")
            .await;
        store
            .put(
                "gs://b/logs/g/7/finished.json",
                br#"{"metadata": {"platform": "linux"}}"#,
            )
            .await;
        store
            .put(
                "gs://b/logs/g/7/artifacts/results.json",
                br#"{"tests": {"t1": {"status": "PASS"}}}"#,
            )
            .await;
        let template = NameTemplate {
            format: "{} [{}]".to_string(),
            parts: vec!["Tests name".to_string(), "platform".to_string()],
        };
        let col = read_build(&store, &build("7"), &template)
            .await
            .expect("column");
        assert!(col.cells.contains_key("t1 [linux]"));
        assert_eq!(col.column.extra, vec!["linux".to_string()]);
    }

    #[tokio::test]
    async fn colliding_rendered_names_stay_unique() {
        let store = FakeStore::default();
        store
            .put("gs://b/logs/g/7/started.json", b"{\"timestamp\": 1000}")
            .await;
        store
            .put(
                "gs://b/logs/g/7/artifacts/results.json",
                br#"{"tests": {"a": {"status": "PASS"}, "b": {"status": "FAIL"}}}"#,
            )
            .await;
        let template = NameTemplate {
            format: "fixed".to_string(),
            parts: Vec::new(),
        };
        let col = read_build(&store, &build("7"), &template)
            .await
            .expect("column");
        assert!(col.cells.contains_key("fixed"));
        assert!(col.cells.contains_key("fixed [2]"));
    }
}
