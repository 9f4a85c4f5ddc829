//! Error types for the record store.

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by a [`crate::JsonStore`].
///
/// Absence is never an error: a missing backing file loads as an empty
/// collection, and updating or removing an id that does not exist is a
/// silent no-op.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode records for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
