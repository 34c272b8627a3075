// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError(pub String);

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PathError {}

/// An object-store location: bucket plus object name.
///
/// Parsed from `gs://bucket/object` form; any scheme is accepted and
/// preserved for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    scheme: String,
    bucket: String,
    object: String,
}

impl Path {
    pub fn from_url(url: &str) -> Result<Self, PathError> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| PathError(format!("invalid object url {url:?}: missing scheme")))?;
        if scheme.is_empty() {
            return Err(PathError(format!("invalid object url {url:?}: empty scheme")));
        }
        let (bucket, object) = match rest.split_once('/') {
            Some((bucket, object)) => (bucket, object),
            None => (rest, ""),
        };
        if bucket.is_empty() {
            return Err(PathError(format!("invalid object url {url:?}: empty bucket")));
        }
        Ok(Self {
            scheme: scheme.to_string(),
            bucket: bucket.to_string(),
            object: object.to_string(),
        })
    }

    /// Builds a path from a `bucket/object` prefix without a scheme.
    pub fn from_prefix(prefix: &str) -> Result<Self, PathError> {
        Self::from_url(&format!("gs://{prefix}"))
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[must_use]
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Appends one object-name segment, inserting `/` as needed.
    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        let mut object = self.object.trim_end_matches('/').to_string();
        if !object.is_empty() {
            object.push('/');
        }
        object.push_str(segment.trim_start_matches('/'));
        Self {
            scheme: self.scheme.clone(),
            bucket: self.bucket.clone(),
            object,
        }
    }

    /// Resolves a reference against this path, like URL reference
    /// resolution: absolute references replace everything, `/`-rooted
    /// references replace the object, and relative references replace
    /// the final segment. Crossing buckets is an error.
    pub fn resolve(&self, reference: &str) -> Result<Self, PathError> {
        if reference.contains("://") {
            let other = Self::from_url(reference)?;
            if other.bucket != self.bucket {
                return Err(PathError(format!(
                    "reference {reference:?} must not change bucket {:?}",
                    self.bucket
                )));
            }
            return Ok(other);
        }
        let object = if let Some(rooted) = reference.strip_prefix('/') {
            rooted.to_string()
        } else {
            match self.object.rsplit_once('/') {
                Some((dir, _)) => format!("{dir}/{reference}"),
                None => reference.to_string(),
            }
        };
        Ok(Self {
            scheme: self.scheme.clone(),
            bucket: self.bucket.clone(),
            object,
        })
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bucket_and_object() {
        let p = Path::from_url("gs://bucket/some/config").expect("path");
        assert_eq!(p.bucket(), "bucket");
        assert_eq!(p.object(), "some/config");
        assert_eq!(p.to_string(), "gs://bucket/some/config");
    }

    #[test]
    fn rejects_missing_scheme_or_bucket() {
        assert!(Path::from_url("bucket/object").is_err());
        assert!(Path::from_url("gs:///object").is_err());
    }

    #[test]
    fn join_inserts_separators() {
        let p = Path::from_url("gs://b/dir/").expect("path");
        assert_eq!(p.join("child").object(), "dir/child");
        assert_eq!(p.join("/child").object(), "dir/child");
    }

    #[test]
    fn resolve_replaces_final_segment() {
        let cfg = Path::from_url("gs://b/cfg/config").expect("path");
        let grid = cfg.resolve("grids/group1").expect("resolve");
        assert_eq!(grid.object(), "cfg/grids/group1");
        assert_eq!(grid.bucket(), "b");
    }

    #[test]
    fn resolve_rooted_reference() {
        let cfg = Path::from_url("gs://b/cfg/config").expect("path");
        assert_eq!(cfg.resolve("/top/obj").expect("resolve").object(), "top/obj");
    }

    #[test]
    fn resolve_rejects_bucket_crossing() {
        let cfg = Path::from_url("gs://b/cfg/config").expect("path");
        assert!(cfg.resolve("gs://other/obj").is_err());
        assert!(cfg.resolve("gs://b/obj").is_ok());
    }
}
