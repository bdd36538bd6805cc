//! Per-index manifest.
//!
//! A small JSON file in the index directory recording the schema version and analyzer
//! an index was built with. It is written outside Tantivy's managed files so segment
//! garbage collection leaves it alone. Reopening an index under a different analyzer
//! is reported as an error.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{IndexError, analyzer::AnalyzerKind};

/// File name of the manifest within the index directory.
pub const MANIFEST_FILE: &str = "wikifind.json";

/// Version of the field layout. Bump when [`crate::IndexSchema`] changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

/// Build parameters of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Field layout version.
    pub schema_version: u32,
    /// Analyzer name.
    pub analyzer: String,
}

/// Returns the path of the manifest inside an index directory.
pub fn manifest_path(index_dir: &Path) -> PathBuf {
    index_dir.join(MANIFEST_FILE)
}

impl IndexManifest {
    /// Manifest for a fresh index built with `analyzer`.
    pub fn new(analyzer: AnalyzerKind) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            analyzer: analyzer.name().to_string(),
        }
    }

    /// Reads the manifest from an index directory.
    ///
    /// Returns `None` if the directory has no manifest.
    pub fn load(index_dir: &Path) -> Result<Option<Self>, IndexError> {
        let bytes = match fs::read(manifest_path(index_dir)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|err| {
            let message = format!("unreadable manifest: {err}");
            error!("{message}");
            IndexError::SchemaMismatch(message)
        })
    }

    /// Writes the manifest into an index directory.
    pub fn save(&self, index_dir: &Path) -> Result<(), IndexError> {
        let bytes = serde_json::to_vec_pretty(self).map_err(io::Error::other)?;
        fs::write(manifest_path(index_dir), bytes)?;
        Ok(())
    }

    /// Fails with `SchemaMismatch` if this manifest differs from `expected`.
    pub fn check(&self, expected: &Self) -> Result<(), IndexError> {
        let message = if self.schema_version != expected.schema_version {
            format!(
                "index has schema version {}, this build uses {}",
                self.schema_version, expected.schema_version
            )
        } else if self.analyzer != expected.analyzer {
            format!(
                "index was built with analyzer '{}', configured analyzer is '{}'",
                self.analyzer, expected.analyzer
            )
        } else {
            return Ok(());
        };
        error!("{message}");
        Err(IndexError::SchemaMismatch(message))
    }
}
