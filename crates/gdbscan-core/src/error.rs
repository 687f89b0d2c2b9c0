//! Custom error types for `gdbscan` operations.
//!
//! Errors fall in two classes. Fatal errors ([`GdbScanError`]) abort a run before or while it
//! writes: the workspace cannot be opened, the log destination cannot be used, or the
//! configuration is invalid. Per-item errors ([`StoreQueryError`]) are absorbed at the
//! granularity of a single feature class and rendered into its log entry.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fatal `gdbscan` failures.
#[derive(Debug, Error)]
pub enum GdbScanError {
    /// The workspace cannot be opened or read.
    #[error(transparent)]
    WorkspaceUnavailable(#[from] WorkspaceError),

    /// The log folder or file cannot be opened or appended to.
    #[error(transparent)]
    LogDestination(#[from] LogDestinationError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Reasons a workspace cannot be opened.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Nothing exists at the workspace locator
    #[error("Workspace not found: '{path}'")]
    NotFound {
        /// The workspace locator
        path: PathBuf,
    },

    /// The locator exists but is not a geodatabase directory
    #[error("Workspace '{path}' is not a directory")]
    NotADirectory {
        /// The workspace locator
        path: PathBuf,
    },

    /// The workspace exists but listing it failed
    #[error("Failed to read workspace '{path}': {source}")]
    Unreadable {
        /// The workspace locator
        path: PathBuf,
        /// The underlying error
        #[source]
        source: StoreQueryError,
    },
}

/// Log destination errors.
#[derive(Debug, Error)]
pub enum LogDestinationError {
    /// The folder that should hold the log file is missing
    #[error("Log folder does not exist: '{path}'")]
    MissingFolder {
        /// The missing folder
        path: PathBuf,
    },

    /// Opening the log file in append mode failed
    #[error("Failed to open log file '{path}': {source}")]
    Open {
        /// The log file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// Appending to an open log failed
    #[error("Failed to append to log '{path}': {source}")]
    Write {
        /// The log file path, or a description of the stream
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors.
///
/// These errors occur when options or configuration are invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required option is missing
    #[error("Missing required option: {option}")]
    MissingRequired {
        /// The missing option name
        option: String,
    },

    /// A names file could not be read
    #[error("Failed to read names file '{path}': {source}")]
    NamesFile {
        /// The names file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },
}

/// A failed query against the geospatial store.
///
/// This is the only recoverable error: the inventory converts it into an
/// `ERROR:` entry and moves on to the next feature class.
#[derive(Debug, Error)]
pub enum StoreQueryError {
    /// The addressed feature class or dataset does not exist
    #[error("'{path}' does not exist")]
    NotFound {
        /// Path of the addressed entity
        path: String,
    },

    /// The store could not be read (permissions, vanished files, ...)
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Path of the addressed entity
        path: String,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The stored document is corrupt
    #[error("failed to parse '{path}': {message}")]
    Corrupt {
        /// Path of the addressed entity
        path: String,
        /// Description of the parse error
        message: String,
    },

    /// The stored document is well formed but is not a feature class
    #[error("'{path}' is not a feature class: {reason}")]
    NotAFeatureClass {
        /// Path of the addressed entity
        path: String,
        /// Why the document was rejected
        reason: String,
    },

    /// More than one file backs the same feature class name
    #[error("'{path}' is ambiguous: backed by {files}")]
    Ambiguous {
        /// Path of the addressed entity
        path: String,
        /// The competing file names, comma separated
        files: String,
    },
}

/// Type alias for Results using `GdbScanError`.
pub type Result<T> = std::result::Result<T, GdbScanError>;

impl GdbScanError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::WorkspaceUnavailable(e) => format!("Workspace unavailable: {e}"),
            Self::LogDestination(e) => format!("Log destination error: {e}"),
            Self::Config(e) => format!("Configuration error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::WorkspaceUnavailable(e) => e.recovery_suggestion(),
            Self::LogDestination(e) => e.recovery_suggestion(),
            Self::Config(ConfigError::MissingRequired { .. }) => {
                Some("Run 'gdbscan help' to see the available options.".to_string())
            },
            Self::Config(ConfigError::NamesFile { .. }) => None,
        }
    }
}

impl WorkspaceError {
    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } => {
                Some("Check that the workspace path is correct and the geodatabase exists.".to_string())
            },
            Self::NotADirectory { .. } => {
                Some("Point the workspace at the geodatabase folder, not a file inside it.".to_string())
            },
            Self::Unreadable { .. } => {
                Some("Check folder permissions and ensure you have read access.".to_string())
            },
        }
    }
}

impl LogDestinationError {
    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::MissingFolder { .. } => {
                Some("Create the log folder first; only the log file is created on demand.".to_string())
            },
            Self::Open { .. } | Self::Write { .. } => {
                Some("Check file permissions and free disk space for the log location.".to_string())
            },
        }
    }
}
