// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::group::TestGroup;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

/// The serialized configuration document enumerating every test group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub test_groups: Vec<TestGroup>,
}

impl Config {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let cfg: Self = serde_json::from_slice(bytes)
            .map_err(|e| ValidationError(format!("parse config: {e}")))?;
        cfg.validate_strict()?;
        Ok(cfg)
    }

    pub fn validate_strict(&self) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for tg in &self.test_groups {
            tg.validate_strict()?;
            if !seen.insert(tg.name.as_str()) {
                return Err(ValidationError(format!(
                    "duplicate test group name {:?}",
                    tg.name
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn find_test_group(&self, name: &str) -> Option<&TestGroup> {
        self.test_groups.iter().find(|tg| tg.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(groups: &str) -> String {
        format!("{{\"test_groups\": {groups}}}")
    }

    #[test]
    fn parses_and_finds_groups() {
        let cfg = Config::from_slice(
            raw(r#"[{"name": "a", "prefix": "b/logs/a"}, {"name": "b", "prefix": "b/logs/b"}]"#)
                .as_bytes(),
        )
        .expect("config");
        assert_eq!(cfg.test_groups.len(), 2);
        assert!(cfg.find_test_group("a").is_some());
        assert!(cfg.find_test_group("missing").is_none());
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Config::from_slice(
            raw(r#"[{"name": "a", "prefix": "p"}, {"name": "a", "prefix": "q"}]"#).as_bytes(),
        )
        .expect_err("duplicate names");
        assert!(err.0.contains("duplicate"));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(Config::from_slice(
            raw(r#"[{"name": "a", "prefix": "p", "surprise": 1}]"#).as_bytes()
        )
        .is_err());
    }

    #[test]
    fn rejects_template_arity_mismatch() {
        let err = Config::from_slice(
            raw(r#"[{"name": "a", "prefix": "p", "name_template": {"format": "{} {}", "parts": ["Tests name"]}}]"#)
                .as_bytes(),
        )
        .expect_err("arity mismatch");
        assert!(err.0.contains("placeholders"));
    }

    #[test]
    fn defaults_are_off() {
        let cfg =
            Config::from_slice(raw(r#"[{"name": "a", "prefix": "p"}]"#).as_bytes()).expect("config");
        let tg = &cfg.test_groups[0];
        assert_eq!(tg.days_of_results, 0);
        assert_eq!(tg.failures_to_open, 0);
        assert!(tg.name_template.is_none());
        assert!(!tg.world_readable);
    }
}
