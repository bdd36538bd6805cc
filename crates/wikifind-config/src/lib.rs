//! Configuration system for wikifind.
//!
//! Configuration lives in a single TOML file (conventionally `wikifind.toml`) owned
//! by the host wiki application. Every setting is optional; omitted values fall back
//! to the defaults documented on each settings struct.

#![warn(missing_docs)]

mod error;
mod parse;
mod validate;

use std::path::{Path, PathBuf};

pub use error::ConfigError;
pub use parse::{
    RawConfig, RawHighlightSettings, RawIndexSettings, RawSearchSettings, parse_config_file,
    parse_config_str,
};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
pub use validate::{ConfigWarning, KNOWN_ANALYZERS, MIN_WRITER_HEAP_PER_THREAD};
use validate::validate_config;

/// Conventional configuration file name.
pub const CONFIG_FILENAME: &str = "wikifind.toml";

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Index storage settings.
    pub index: IndexSettings,
    /// Query settings.
    pub search: SearchSettings,
    /// Fragment highlighting settings.
    pub highlight: HighlightSettings,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// A relative `index.root` is resolved against the directory containing the file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = parse_config_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self::from_raw(raw, base_dir))
    }

    /// Parses configuration from TOML text, resolving relative paths against `base_dir`.
    pub fn from_toml_str(contents: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let raw = parse_config_str(contents, &base_dir.join(CONFIG_FILENAME))?;
        Ok(Self::from_raw(raw, base_dir))
    }

    /// Applies defaults to a raw configuration.
    pub fn from_raw(raw: RawConfig, base_dir: &Path) -> Self {
        let index = raw.index.unwrap_or_default();
        let search = raw.search.unwrap_or_default();
        let highlight = raw.highlight.unwrap_or_default();

        let index_defaults = IndexSettings::default();
        let search_defaults = SearchSettings::default();
        let highlight_defaults = HighlightSettings::default();

        Self {
            index: IndexSettings {
                root: index.root.map(|root| base_dir.join(root)),
                writer_heap_bytes: index
                    .writer_heap_bytes
                    .unwrap_or(index_defaults.writer_heap_bytes),
                writer_threads: index.writer_threads.unwrap_or(index_defaults.writer_threads),
            },
            search: SearchSettings {
                limit: search.limit.unwrap_or(search_defaults.limit),
                analyzer: search.analyzer.unwrap_or(search_defaults.analyzer),
            },
            highlight: HighlightSettings {
                max_fragments: highlight
                    .max_fragments
                    .unwrap_or(highlight_defaults.max_fragments),
                fragment_chars: highlight
                    .fragment_chars
                    .unwrap_or(highlight_defaults.fragment_chars),
                separator: highlight.separator.unwrap_or(highlight_defaults.separator),
                pre_tag: highlight.pre_tag.unwrap_or(highlight_defaults.pre_tag),
                post_tag: highlight.post_tag.unwrap_or(highlight_defaults.post_tag),
            },
        }
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective settings in `wikifind.toml` format.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Index storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Directory holding one index per wiki. `None` selects the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Memory budget for a writer, in bytes (default 50 MB).
    pub writer_heap_bytes: usize,
    /// Number of indexing threads per writer (default 1).
    pub writer_threads: usize,
}

impl IndexSettings {
    /// Returns the configured index root, or the platform data directory when unset.
    ///
    /// Returns `None` only when no root is configured and the platform has no home directory.
    pub fn resolved_root(&self) -> Option<PathBuf> {
        self.root.clone().or_else(default_index_root)
    }
}

/// Platform data directory for indexes, e.g. `~/.local/share/wikifind/index` on Linux.
pub fn default_index_root() -> Option<PathBuf> {
    ProjectDirs::from("", "", "wikifind").map(|dirs| dirs.data_dir().join("index"))
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            root: None,
            writer_heap_bytes: 50_000_000,
            writer_threads: 1,
        }
    }
}

/// Query settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum results per query; extra matches are dropped (default 100).
    pub limit: usize,
    /// Analyzer used for indexing, querying and highlighting (default `simple`).
    pub analyzer: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            limit: 100,
            analyzer: String::from("simple"),
        }
    }
}

/// Fragment highlighting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightSettings {
    /// Maximum fragments per highlighted field (default 3).
    pub max_fragments: usize,
    /// Maximum characters per fragment (default 100).
    pub fragment_chars: usize,
    /// Separator placed between joined fragments (default ` [...] `).
    pub separator: String,
    /// Marker inserted before each matched term.
    pub pre_tag: String,
    /// Marker inserted after each matched term.
    pub post_tag: String,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            max_fragments: 3,
            fragment_chars: 100,
            separator: String::from(" [...] "),
            pre_tag: String::from("<b class=\"searchkeyword\">"),
            post_tag: String::from("</b>"),
        }
    }
}
