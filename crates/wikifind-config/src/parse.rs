//! Configuration file parsing.
//!
//! Parses a `wikifind.toml` file into a [`RawConfig`] whose fields are all optional,
//! so that omitted settings fall back to defaults during resolution.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::ConfigError;

/// Raw configuration as parsed directly from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// Index storage section.
    pub index: Option<RawIndexSettings>,
    /// Search section.
    pub search: Option<RawSearchSettings>,
    /// Highlighting section.
    pub highlight: Option<RawHighlightSettings>,
}

/// Raw index storage settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawIndexSettings {
    /// Directory holding one index per wiki.
    pub root: Option<String>,
    /// Memory budget for a writer, in bytes.
    pub writer_heap_bytes: Option<usize>,
    /// Number of indexing threads per writer.
    pub writer_threads: Option<usize>,
}

/// Raw search settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSearchSettings {
    /// Maximum results per query.
    pub limit: Option<usize>,
    /// Analyzer name: `simple` or a stemming language.
    pub analyzer: Option<String>,
}

/// Raw highlighting settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawHighlightSettings {
    /// Maximum fragments per highlighted field.
    pub max_fragments: Option<usize>,
    /// Maximum characters per fragment.
    pub fragment_chars: Option<usize>,
    /// Separator placed between fragments when they are joined.
    pub separator: Option<String>,
    /// Marker inserted before a matched term.
    pub pre_tag: Option<String>,
    /// Marker inserted after a matched term.
    pub post_tag: Option<String>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config() {
        let config = parse_config_str("", Path::new("wikifind.toml")).unwrap();
        assert!(config.index.is_none());
        assert!(config.search.is_none());
        assert!(config.highlight.is_none());
    }

    #[test]
    fn partial_sections() {
        let toml = r#"
[search]
limit = 20

[highlight]
separator = " ... "
"#;
        let config = parse_config_str(toml, Path::new("wikifind.toml")).unwrap();
        let search = config.search.unwrap();
        assert_eq!(search.limit, Some(20));
        assert!(search.analyzer.is_none());

        let highlight = config.highlight.unwrap();
        assert_eq!(highlight.separator.as_deref(), Some(" ... "));
        assert!(highlight.max_fragments.is_none());
    }

    #[test]
    fn index_section() {
        let toml = r#"
[index]
root = "search-data"
writer_heap_bytes = 30000000
writer_threads = 2
"#;
        let index = parse_config_str(toml, Path::new("wikifind.toml"))
            .unwrap()
            .index
            .unwrap();
        assert_eq!(index.root.as_deref(), Some("search-data"));
        assert_eq!(index.writer_heap_bytes, Some(30_000_000));
        assert_eq!(index.writer_threads, Some(2));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_config_str("[search]\nstemmer = \"english\"\n", Path::new("x.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains("x.toml"));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let err = parse_config_str("[search]\nlimit = \"many\"\n", Path::new("x.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }
}
