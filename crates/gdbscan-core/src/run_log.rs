//! Append-only run log.
//!
//! A [`RunLog`] owns the log output for exactly one run. It is opened once, appended to
//! line by line, and closed when it goes out of scope, whichever way the run ends. Every
//! line is flushed as it is written so an aborted run still leaves the lines it produced.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::debug;

use crate::check::CheckResult;
use crate::error::LogDestinationError;
use crate::types::FeatureCollectionRecord;

/// Separator line framing each run-block header.
pub const RULE: &str = "------------------------------------------------------------";

/// Column legend written under the run-block header.
pub const COLUMNS: &str = "FeatureClass | FeatureCount | SpatialReference";

/// Timestamp format of run-block headers.
pub const HEADER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format of check summary lines.
pub const SUMMARY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Outcome recorded for one feature class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Count and spatial reference were retrieved
    Record(FeatureCollectionRecord),
    /// Processing failed with this message
    Error(String),
}

/// One line of an inventory run-block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Relative path of the feature class (or of the dataset that failed to list)
    pub path: String,
    /// What happened
    pub outcome: EntryOutcome,
}

impl LogEntry {
    /// Entry for a successfully described feature class.
    #[must_use]
    pub fn record(path: impl AsRef<str>, record: FeatureCollectionRecord) -> Self {
        let record = FeatureCollectionRecord {
            spatial_reference: single_line(&record.spatial_reference),
            ..record
        };
        Self {
            path: single_line(path.as_ref()),
            outcome: EntryOutcome::Record(record),
        }
    }

    /// Entry for a feature class that could not be processed.
    #[must_use]
    pub fn error(path: impl AsRef<str>, message: impl fmt::Display) -> Self {
        Self {
            path: single_line(path.as_ref()),
            outcome: EntryOutcome::Error(single_line(&message.to_string())),
        }
    }

    /// Returns `true` for error entries.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, EntryOutcome::Error(_))
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            EntryOutcome::Record(record) => write!(
                f,
                "{} | {} | {}",
                self.path, record.count, record.spatial_reference
            ),
            EntryOutcome::Error(message) => write!(f, "{} | ERROR: {message}", self.path),
        }
    }
}

/// Keeps one entry per line whatever the store reports.
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Scope-owned append handle for a log destination.
#[derive(Debug)]
pub struct RunLog<W: Write> {
    writer: W,
    destination: PathBuf,
}

impl RunLog<LineWriter<File>> {
    /// Opens `path` for appending, creating the file if needed.
    ///
    /// The folder holding the log must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`LogDestinationError::MissingFolder`] if the parent folder does not exist and
    /// [`LogDestinationError::Open`] if the file cannot be opened for appending.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, LogDestinationError> {
        let path = path.as_ref();

        if let Some(folder) = path.parent() {
            if !folder.as_os_str().is_empty() && !folder.is_dir() {
                return Err(LogDestinationError::MissingFolder {
                    path: folder.to_path_buf(),
                });
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LogDestinationError::Open {
                path: path.to_path_buf(),
                source: e,
            })?;

        debug!("Appending to log {}", path.display());
        Ok(Self::new(LineWriter::new(file), path))
    }
}

impl<W: Write> RunLog<W> {
    /// Wraps an already opened writer; `destination` is used in error messages.
    pub fn new(writer: W, destination: impl Into<PathBuf>) -> Self {
        Self {
            writer,
            destination: destination.into(),
        }
    }

    /// Starts a run-block for `workspace`.
    ///
    /// # Errors
    ///
    /// Returns [`LogDestinationError::Write`] if the header cannot be appended.
    pub fn write_header(
        &mut self,
        timestamp: NaiveDateTime,
        workspace: &str,
    ) -> Result<(), LogDestinationError> {
        let header = format!(
            "\n{RULE}\nLog run at: {}\nWorkspace: {workspace}\n{COLUMNS}\n{RULE}\n",
            timestamp.format(HEADER_TIMESTAMP_FORMAT)
        );
        self.write_raw(&header)
    }

    /// Appends one entry line.
    ///
    /// # Errors
    ///
    /// Returns [`LogDestinationError::Write`] if the line cannot be appended.
    pub fn append(&mut self, entry: &LogEntry) -> Result<(), LogDestinationError> {
        self.write_raw(&format!("{entry}\n"))
    }

    /// Appends the found/missing summary of an existence check.
    ///
    /// # Errors
    ///
    /// Returns [`LogDestinationError::Write`] if the summary cannot be appended.
    pub fn write_check_summary(
        &mut self,
        timestamp: NaiveDateTime,
        result: &CheckResult,
    ) -> Result<(), LogDestinationError> {
        let stamp = timestamp.format(SUMMARY_TIMESTAMP_FORMAT).to_string();

        let mut summary = format!(
            "{stamp} - INFO - Found Feature Classes: {}\n{stamp} - INFO - Missing Feature Classes: {}\n",
            result.found.join(", "),
            result.missing.join(", "),
        );
        if !result.errored.is_empty() {
            let unresolved: Vec<String> = result
                .errored
                .iter()
                .map(|f| format!("{} ({})", f.name, f.message))
                .collect();
            summary.push_str(&format!(
                "{stamp} - WARNING - Unresolved Feature Classes: {}\n",
                unresolved.join("; ")
            ));
        }
        self.write_raw(&summary)
    }

    /// Flushes and closes the log, surfacing any final write error.
    ///
    /// # Errors
    ///
    /// Returns [`LogDestinationError::Write`] if the final flush fails.
    pub fn finish(mut self) -> Result<W, LogDestinationError> {
        self.writer.flush().map_err(|e| self.write_error(e))?;
        Ok(self.writer)
    }

    fn write_raw(&mut self, text: &str) -> Result<(), LogDestinationError> {
        self.writer
            .write_all(text.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|e| self.write_error(e))
    }

    fn write_error(&self, source: std::io::Error) -> LogDestinationError {
        LogDestinationError::Write {
            path: self.destination.clone(),
            source,
        }
    }
}
