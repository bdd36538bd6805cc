//! Error types for the wikifind-index crate.

use std::{io, path::PathBuf};

use thiserror::Error;
use wikifind_query::QueryError;

/// Errors that can occur when working with a wiki index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index could not be opened, or its writer or reader could not be acquired.
    #[error("index storage unavailable at {path}: {message}")]
    StorageUnavailable {
        /// Location of the index.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Adding, deleting or committing documents failed.
    #[error("failed to write to index: {0}")]
    IndexWriteFailed(String),

    /// A stored document carries a type tag this version does not know.
    #[error("invalid document type: {0}")]
    InvalidDocumentType(String),

    /// The on-disk index was built with an incompatible schema or analyzer.
    #[error("index schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The search phrase could not be parsed or compiled.
    #[error(transparent)]
    QueryParse(#[from] QueryError),

    /// Invalid stemmer language.
    #[error("unsupported analyzer language: {0}")]
    InvalidLanguage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl IndexError {
    /// Creates a `StorageUnavailable` error from a path and Tantivy error.
    pub(crate) fn storage(path: PathBuf, source: &tantivy::TantivyError) -> Self {
        Self::StorageUnavailable {
            path,
            message: source.to_string(),
        }
    }

    /// Creates an `IndexWriteFailed` error from a Tantivy error.
    pub(crate) fn write(source: &tantivy::TantivyError) -> Self {
        Self::IndexWriteFailed(source.to_string())
    }

    /// Returns true if retrying the operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable { .. } | Self::IndexWriteFailed(_) | Self::Io(_)
        )
    }
}
