use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Failure kinds for daily-note storage.
///
/// None of these are fatal: the session degrades to an empty or unchanged
/// state and records a diagnostic instead of propagating a crash.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vault root is not configured")]
    ConfigurationMissing,

    #[error("no daily note exists for {0}")]
    DocumentNotFound(NaiveDate),

    #[error("i/o failure on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
