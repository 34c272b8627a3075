// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::time::Duration;

use gridfold_core::days;
use serde::{Deserialize, Serialize};

use crate::config::ValidationError;

pub const DEFAULT_DAYS_OF_RESULTS: f64 = 7.0;

/// The raw test name resolves through this reserved template part.
pub const TESTS_NAME_PART: &str = "Tests name";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestGroup {
    pub name: String,
    /// `bucket/path/to/builds` prefix holding this group's builds.
    pub prefix: String,
    #[serde(default)]
    pub days_of_results: u32,
    #[serde(default)]
    pub failures_to_open: u32,
    #[serde(default)]
    pub passes_to_close: u32,
    #[serde(default)]
    pub name_template: Option<NameTemplate>,
    #[serde(default)]
    pub world_readable: bool,
}

impl TestGroup {
    /// Lookback window beyond which older builds are excluded.
    #[must_use]
    pub fn retention(&self) -> Duration {
        if self.days_of_results > 0 {
            days(f64::from(self.days_of_results))
        } else {
            days(DEFAULT_DAYS_OF_RESULTS)
        }
    }

    /// Alert thresholds, or `None` when alerts are disabled.
    ///
    /// `passes_to_close` of zero means one pass closes the alert.
    #[must_use]
    pub fn alert_policy(&self) -> Option<AlertPolicy> {
        if self.failures_to_open == 0 {
            return None;
        }
        let passes_to_close = if self.passes_to_close == 0 {
            1
        } else {
            self.passes_to_close
        };
        Some(AlertPolicy {
            failures_to_open: self.failures_to_open as usize,
            passes_to_close: passes_to_close as usize,
        })
    }

    pub fn validate_strict(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError("test group name must not be empty".to_string()));
        }
        if self.prefix.trim().is_empty() {
            return Err(ValidationError(format!(
                "test group {}: prefix must not be empty",
                self.name
            )));
        }
        if let Some(template) = &self.name_template {
            template
                .validate()
                .map_err(|e| ValidationError(format!("test group {}: {e}", self.name)))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    pub failures_to_open: usize,
    pub passes_to_close: usize,
}

/// Row-name template: a format string with `{}` placeholders plus the
/// ordered metadata keys that fill them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameTemplate {
    pub format: String,
    pub parts: Vec<String>,
}

impl Default for NameTemplate {
    fn default() -> Self {
        Self {
            format: "{}".to_string(),
            parts: vec![TESTS_NAME_PART.to_string()],
        }
    }
}

impl NameTemplate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let placeholders = self.format.matches("{}").count();
        if placeholders != self.parts.len() {
            return Err(ValidationError(format!(
                "name template {:?} has {placeholders} placeholders but {} parts",
                self.format,
                self.parts.len()
            )));
        }
        Ok(())
    }

    /// Renders the canonical row name for one test.
    ///
    /// Each part resolves through the build metadata; the reserved part
    /// `"Tests name"` resolves to the raw test name, and absent keys
    /// render as `missing`.
    #[must_use]
    pub fn render(&self, test_name: &str, metadata: &BTreeMap<String, String>) -> String {
        let mut out = String::with_capacity(self.format.len() + test_name.len());
        let mut parts = self.parts.iter();
        let mut rest = self.format.as_str();
        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            rest = &rest[pos + 2..];
            let value = match parts.next() {
                Some(part) if part == TESTS_NAME_PART => test_name,
                Some(part) => metadata.get(part).map_or("missing", String::as_str),
                None => "missing",
            };
            out.push_str(value);
        }
        out.push_str(rest);
        out
    }
}
