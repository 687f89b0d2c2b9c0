//! Existence checks for expected feature classes.
//!
//! Names are resolved at the workspace root only. A failed existence query is kept apart
//! from a negative answer: it lands in [`CheckResult::errored`] with its message.

use std::collections::HashSet;

use log::{debug, warn};

use crate::store::GeoStore;

/// A name whose existence query failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    /// The requested name
    pub name: String,
    /// Why the store could not answer
    pub message: String,
}

/// Partition of the requested names.
///
/// Every distinct requested name appears in exactly one of the three lists, in the order it
/// was first requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckResult {
    /// Names present at the workspace root
    pub found: Vec<String>,
    /// Names the store reported as absent
    pub missing: Vec<String>,
    /// Names the store could not resolve
    pub errored: Vec<CheckFailure>,
}

impl CheckResult {
    /// Number of distinct names classified.
    #[must_use]
    pub fn len(&self) -> usize {
        self.found.len() + self.missing.len() + self.errored.len()
    }

    /// Returns `true` when no names were requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classifies each distinct name in `names` as found, missing or errored.
///
/// Duplicates are queried once; the first occurrence decides the position.
///
/// # Examples
///
/// ```
/// use gdbscan_core::check::check;
/// use gdbscan_core::store::FileGdb;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("A.geojson"), r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
/// let gdb = FileGdb::open(dir.path()).unwrap();
///
/// let result = check(&gdb, ["A", "B", "A"]);
/// assert_eq!(result.found, vec!["A"]);
/// assert_eq!(result.missing, vec!["B"]);
/// ```
pub fn check<S, I, N>(store: &S, names: I) -> CheckResult
where
    S: GeoStore + ?Sized,
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut result = CheckResult::default();

    for name in names {
        let name = name.as_ref();
        if !seen.insert(name.to_string()) {
            debug!("Skipping duplicate name {name}");
            continue;
        }

        match store.exists(name) {
            Ok(true) => result.found.push(name.to_string()),
            Ok(false) => result.missing.push(name.to_string()),
            Err(e) => {
                warn!("Existence check failed for {name}: {e}");
                result.errored.push(CheckFailure {
                    name: name.to_string(),
                    message: e.to_string(),
                });
            },
        }
    }

    debug!(
        "Checked {} name(s): {} found, {} missing, {} errored",
        result.len(),
        result.found.len(),
        result.missing.len(),
        result.errored.len()
    );
    result
}
