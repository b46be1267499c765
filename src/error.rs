//! Errors that abort a check run.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of a check run. No partial report is produced when one
/// of these is returned.
///
/// Unreadable source files are not represented here: they are recorded as
/// [`SkippedFile`](crate::scan::SkippedFile) entries on the report and the
/// run continues.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("root dir {path:?} could not be resolved: {reason}")]
    RootUnresolvable { path: PathBuf, reason: String },

    #[error("catalog {path:?} not found or not readable: {source}")]
    CatalogUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog {path:?} is malformed: {reason}")]
    CatalogMalformed { path: PathBuf, reason: String },

    #[error("catalog {path:?} has an unsupported format (expected .xml, .json, .yaml or .yml)")]
    UnsupportedCatalogFormat { path: PathBuf },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("check cancelled")]
    Cancelled,

    #[error("check deadline exceeded")]
    DeadlineExceeded,
}
