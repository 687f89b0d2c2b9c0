//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions for presenting check
//! results and workspace listings in a human-readable format.

use tabled::{Table, Tabled};

use gdbscan_core::check::CheckResult;
use gdbscan_core::inventory::Enumeration;

/// Table row representation for one checked name.
#[derive(Tabled)]
pub struct CheckRow {
    /// Requested feature class name.
    #[tabled(rename = "Feature Class")]
    pub name: String,
    /// `Found`, `Missing` or `Error`.
    #[tabled(rename = "Status")]
    pub status: String,
    /// Store message for names that could not be resolved.
    #[tabled(rename = "Detail")]
    pub detail: String,
}

/// Table row representation for one enumerated feature class.
#[derive(Tabled)]
pub struct CollectionRow {
    /// Path relative to the workspace.
    #[tabled(rename = "Feature Class")]
    pub path: String,
    /// Containing feature dataset, `-` at the root.
    #[tabled(rename = "Dataset")]
    pub dataset: String,
}

/// Renders a check result as a table followed by a one-line summary.
#[must_use]
pub fn render_check_result(result: &CheckResult) -> String {
    let found = result.found.iter().map(|name| CheckRow {
        name: name.clone(),
        status: "Found".to_string(),
        detail: String::new(),
    });
    let missing = result.missing.iter().map(|name| CheckRow {
        name: name.clone(),
        status: "Missing".to_string(),
        detail: String::new(),
    });
    let errored = result.errored.iter().map(|failure| CheckRow {
        name: failure.name.clone(),
        status: "Error".to_string(),
        detail: failure.message.clone(),
    });
    let rows: Vec<CheckRow> = found.chain(missing).chain(errored).collect();

    let mut out = String::new();
    if !rows.is_empty() {
        out.push_str(&Table::new(rows).to_string());
        out.push('\n');
    }
    out.push_str(&format!(
        "{} found, {} missing, {} unresolved",
        result.found.len(),
        result.missing.len(),
        result.errored.len()
    ));
    out
}

/// Renders enumerated feature classes and any dataset that failed to list.
#[must_use]
pub fn render_enumeration(enumeration: &Enumeration) -> String {
    let rows: Vec<CollectionRow> = enumeration
        .refs
        .iter()
        .map(|fc| CollectionRow {
            path: fc.relative_path(),
            dataset: fc.dataset().unwrap_or("-").to_string(),
        })
        .collect();

    let mut out = format!("\nFeature Classes ({} total):\n\n", rows.len());
    out.push_str(&Table::new(rows).to_string());

    for failure in &enumeration.failed_datasets {
        out.push_str(&format!(
            "\nDataset '{}' could not be listed: {}",
            failure.dataset, failure.error
        ));
    }
    out
}

/// Print a check result to standard output.
pub fn display_check_result(result: &CheckResult) {
    println!("{}", render_check_result(result));
}

/// Print an enumeration to standard output.
pub fn display_enumeration(enumeration: &Enumeration) {
    println!("{}", render_enumeration(enumeration));
}
