// SPDX-License-Identifier: Apache-2.0

use gridfold_core::natural_cmp;

use crate::path::Path;
use crate::store::{ObjectStore, StoreError};

/// One build under a group prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    /// Base name of the build's subdirectory, without trailing slash.
    pub name: String,
    /// Prefix holding the build's artifacts.
    pub path: Path,
    /// Decoded build number, when the name is numeric.
    pub ordinal: Option<u64>,
}

/// Enumerates builds under a group prefix, newest first.
///
/// Common prefixes one level below the group prefix are builds. Numeric
/// names (optionally zero-padded) order by value; anything else falls
/// back to natural ordering, so ISO timestamps stay chronological.
/// Both orders are descending.
pub async fn list_builds(store: &dyn ObjectStore, prefix: &Path) -> Result<Vec<Build>, StoreError> {
    let entries = store.list(prefix, "/").await?;
    let mut builds = Vec::new();
    for entry in entries {
        if !entry.common_prefix {
            continue;
        }
        let name = entry
            .name
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            continue;
        }
        let ordinal = name.parse::<u64>().ok();
        let path = prefix.join(&name);
        builds.push(Build {
            name,
            path,
            ordinal,
        });
    }
    builds.sort_by(|a, b| match (a.ordinal, b.ordinal) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| b.name.cmp(&a.name)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => natural_cmp(&b.name, &a.name),
    });
    Ok(builds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeStore;

    async fn seed(store: &FakeStore, names: &[&str]) {
        for name in names {
            store
                .put(&format!("gs://b/logs/g/{name}/started.json"), b"{}")
                .await;
        }
    }

    #[tokio::test]
    async fn numeric_names_order_by_value_descending() {
        let store = FakeStore::default();
        seed(&store, &["2", "10", "9"]).await;
        let builds = list_builds(&store, &Path::from_url("gs://b/logs/g").expect("path"))
            .await
            .expect("list");
        let names: Vec<&str> = builds.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["10", "9", "2"]);
    }

    #[tokio::test]
    async fn zero_padded_names_decode() {
        let store = FakeStore::default();
        seed(&store, &["0010", "0002"]).await;
        let builds = list_builds(&store, &Path::from_url("gs://b/logs/g").expect("path"))
            .await
            .expect("list");
        assert_eq!(builds[0].name, "0010");
        assert_eq!(builds[0].ordinal, Some(10));
        assert_eq!(builds[1].ordinal, Some(2));
    }

    #[tokio::test]
    async fn timestamps_fall_back_to_natural_descending() {
        let store = FakeStore::default();
        seed(&store, &["2026-01-02T10:00", "2026-01-10T10:00", "2026-01-02T09:00"]).await;
        let builds = list_builds(&store, &Path::from_url("gs://b/logs/g").expect("path"))
            .await
            .expect("list");
        let names: Vec<&str> = builds.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["2026-01-10T10:00", "2026-01-02T10:00", "2026-01-02T09:00"]
        );
    }

    #[tokio::test]
    async fn plain_objects_under_the_prefix_are_ignored() {
        let store = FakeStore::default();
        seed(&store, &["1"]).await;
        store.put("gs://b/logs/g/latest-build.txt", b"1").await;
        let builds = list_builds(&store, &Path::from_url("gs://b/logs/g").expect("path"))
            .await
            .expect("list");
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].path.object(), "logs/g/1");
    }
}
