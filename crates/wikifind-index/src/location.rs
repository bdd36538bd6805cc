//! Index location resolution.
//!
//! Every wiki gets its own index. A [`IndexLocator`] decides where: a directory under
//! a shared root ([`DirectoryLocator`]) or process memory ([`InMemoryLocator`]).

use std::{
    fmt::Write,
    path::{Path, PathBuf},
};

use wikifind_config::IndexSettings;

use crate::IndexError;

/// Name used on disk for the wiki whose id is empty.
const EMPTY_WIKI_DIR: &str = "%";

/// Where a wiki's index lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLocation {
    /// A memory-mapped directory on disk.
    Directory(PathBuf),
    /// Process memory; contents vanish with the store.
    InMemory,
}

impl IndexLocation {
    /// Path used in error messages and logs.
    pub fn display_path(&self) -> PathBuf {
        match self {
            Self::Directory(path) => path.clone(),
            Self::InMemory => PathBuf::from("<memory>"),
        }
    }
}

/// Resolves the storage location of each wiki's index.
pub trait IndexLocator: Send + Sync {
    /// Returns the location of `wiki`'s index.
    fn locate(&self, wiki: &str) -> IndexLocation;
}

/// Stores each wiki's index in `<root>/<escaped wiki id>`.
#[derive(Debug, Clone)]
pub struct DirectoryLocator {
    /// Directory holding one subdirectory per wiki.
    root: PathBuf,
}

impl DirectoryLocator {
    /// Creates a locator rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a locator from the configured root, falling back to the platform data directory.
    pub fn from_settings(settings: &IndexSettings) -> Result<Self, IndexError> {
        settings
            .resolved_root()
            .map(Self::new)
            .ok_or_else(|| IndexError::StorageUnavailable {
                path: PathBuf::new(),
                message: "no index root configured and no platform data directory".to_string(),
            })
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl IndexLocator for DirectoryLocator {
    fn locate(&self, wiki: &str) -> IndexLocation {
        IndexLocation::Directory(self.root.join(escape_wiki_id(wiki)))
    }
}

/// Keeps every index in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryLocator;

impl IndexLocator for InMemoryLocator {
    fn locate(&self, _wiki: &str) -> IndexLocation {
        IndexLocation::InMemory
    }
}

/// Maps a wiki id to a single safe path component.
///
/// ASCII alphanumerics and `-` pass through; every other byte becomes `%XX`.
/// The mapping is injective, so distinct wikis never share a directory.
pub fn escape_wiki_id(wiki: &str) -> String {
    if wiki.is_empty() {
        return EMPTY_WIKI_DIR.to_string();
    }
    let mut escaped = String::with_capacity(wiki.len());
    for byte in wiki.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            escaped.push(char::from(byte));
        } else {
            let _ = write!(escaped, "%{byte:02X}");
        }
    }
    escaped
}
