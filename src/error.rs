//! Error types surfaced to the application shell.
//!
//! Library-level failures are typed with `thiserror`; the binary wraps them
//! in `anyhow` at its boundary and reports the rest through the status bar.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of list controller operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("index {index} is out of range for a list of {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Failures of the import pipeline
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{} is not a .{expected} file", path.display())]
    UnsupportedExtension { path: PathBuf, expected: String },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode definitions from {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("import of {} timed out after {}s", path.display(), timeout.as_secs())]
    TimedOut { path: PathBuf, timeout: Duration },
}

/// Failures of the export path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("export is not implemented yet")]
    NotImplemented,
}
