//! Feature class inventory: enumerate, describe, report.
//!
//! [`enumerate`] collects the top-level feature classes followed by those of every feature
//! dataset. [`run_inventory`] then describes each one in order and appends one line per
//! feature class to a [`RunLog`]. A failure on one feature class is written as an `ERROR`
//! line and never stops the run; only an unreadable workspace or an unusable log is fatal.

use std::io::Write;

use chrono::NaiveDateTime;
use log::{debug, info, warn};

use crate::error::{Result, StoreQueryError, WorkspaceError};
use crate::run_log::{LogEntry, RunLog};
use crate::store::GeoStore;
use crate::types::{FeatureCollectionRecord, FeatureCollectionRef};

/// A feature dataset whose contents could not be listed.
#[derive(Debug)]
pub struct DatasetFailure {
    /// Dataset name
    pub dataset: String,
    /// Why listing failed
    pub error: StoreQueryError,
}

/// Result of walking a workspace.
#[derive(Debug, Default)]
pub struct Enumeration {
    /// Discovered feature classes: top-level first, then per dataset, in listing order
    pub refs: Vec<FeatureCollectionRef>,
    /// Datasets that could not be listed
    pub failed_datasets: Vec<DatasetFailure>,
}

impl Enumeration {
    /// Orders the discovered feature classes by relative path.
    pub fn sort_by_path(&mut self) {
        self.refs.sort_by_cached_key(FeatureCollectionRef::relative_path);
    }
}

/// Options for an inventory run.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryOptions {
    /// Sort feature classes by relative path instead of keeping the store's listing order
    pub sort_by_path: bool,
}

/// Counters for a finished inventory run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventorySummary {
    /// Feature classes logged with a count and spatial reference
    pub described: usize,
    /// Error lines logged (feature classes and unlistable datasets)
    pub failed: usize,
}

impl InventorySummary {
    /// Total number of lines logged.
    #[must_use]
    pub fn total(&self) -> usize {
        self.described + self.failed
    }
}

/// Lists every feature class of the workspace.
///
/// No de-duplication takes place: whatever the store lists twice is returned twice.
///
/// # Errors
///
/// Returns [`WorkspaceError::Unreadable`] if the top-level feature classes or the feature
/// datasets cannot be listed. A dataset whose contents cannot be listed is recorded in
/// [`Enumeration::failed_datasets`] instead.
pub fn enumerate<S>(store: &S) -> std::result::Result<Enumeration, WorkspaceError>
where
    S: GeoStore + ?Sized,
{
    let unreadable = |source| WorkspaceError::Unreadable {
        path: store.locator().into(),
        source,
    };

    let mut enumeration = Enumeration::default();

    for name in store.list_top_level_collections().map_err(unreadable)? {
        enumeration.refs.push(FeatureCollectionRef::top_level(name));
    }

    for dataset in store.list_containers().map_err(unreadable)? {
        match store.list_collections_in_container(&dataset) {
            Ok(names) => {
                debug!("Dataset {dataset} holds {} feature class(es)", names.len());
                enumeration.refs.extend(
                    names
                        .into_iter()
                        .map(|name| FeatureCollectionRef::in_dataset(dataset.as_str(), name)),
                );
            },
            Err(error) => {
                warn!("Failed to list dataset {dataset}: {error}");
                enumeration
                    .failed_datasets
                    .push(DatasetFailure { dataset, error });
            },
        }
    }

    debug!(
        "Enumerated {} feature class(es) in {}",
        enumeration.refs.len(),
        store.locator()
    );
    Ok(enumeration)
}

/// Retrieves the count and spatial reference of one feature class.
///
/// # Errors
///
/// Returns the first [`StoreQueryError`] raised by the count or describe query.
pub fn describe_collection<S>(
    store: &S,
    feature_class: &FeatureCollectionRef,
) -> std::result::Result<FeatureCollectionRecord, StoreQueryError>
where
    S: GeoStore + ?Sized,
{
    let path = feature_class.relative_path();
    debug!("Describing {}", store.resolve(&path));

    let count = store.count(&path)?;
    let description = store.describe(&path)?;

    Ok(FeatureCollectionRecord {
        count,
        spatial_reference: description.spatial_reference_label(),
    })
}

/// Runs a full inventory of `store` into `log`.
///
/// Writes the run-block header stamped with `started_at`, then one entry per feature class in
/// enumeration order, then one error entry per dataset that could not be listed. `on_entry` is
/// called with each entry right after it has been appended, which is how callers mirror the
/// log to the console.
///
/// # Errors
///
/// Returns an error if the workspace cannot be enumerated or the log cannot be appended to.
/// Per feature class failures are logged and counted, never returned.
pub fn run_inventory<S, W, F>(
    store: &S,
    log: &mut RunLog<W>,
    started_at: NaiveDateTime,
    options: InventoryOptions,
    mut on_entry: F,
) -> Result<InventorySummary>
where
    S: GeoStore + ?Sized,
    W: Write,
    F: FnMut(&LogEntry),
{
    let mut enumeration = enumerate(store)?;
    if options.sort_by_path {
        enumeration.sort_by_path();
    }

    log.write_header(started_at, store.locator())?;

    let mut summary = InventorySummary::default();
    let mut emit = |log: &mut RunLog<W>, entry: LogEntry| -> Result<()> {
        if entry.is_error() {
            summary.failed += 1;
        } else {
            summary.described += 1;
        }
        log.append(&entry)?;
        on_entry(&entry);
        Ok(())
    };

    for feature_class in &enumeration.refs {
        let path = feature_class.relative_path();
        let entry = match describe_collection(store, feature_class) {
            Ok(record) => LogEntry::record(path, record),
            Err(e) => {
                warn!("Failed to describe {path}: {e}");
                LogEntry::error(path, e)
            },
        };
        emit(log, entry)?;
    }

    for failure in &enumeration.failed_datasets {
        emit(log, LogEntry::error(failure.dataset.as_str(), &failure.error))?;
    }

    info!(
        "Inventory of {} complete: {} described, {} failed",
        store.locator(),
        summary.described,
        summary.failed
    );
    Ok(summary)
}
