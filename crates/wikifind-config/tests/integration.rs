//! Integration tests for wikifind-config.
//!
//! Exercises loading from disk: parse -> resolve -> validate.

#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::PathBuf};

use wikifind_config::{CONFIG_FILENAME, Config, ConfigError, ConfigWarning};

/// Writes `content` to a config file inside a fresh temp dir.
fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILENAME);
    fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_load_full_config() {
    let (dir, path) = write_config(
        r#"
[index]
root = "indexes"
writer_heap_bytes = 60000000
writer_threads = 2

[search]
limit = 25
analyzer = "french"

[highlight]
max_fragments = 2
fragment_chars = 80
separator = " ... "
pre_tag = "<em>"
post_tag = "</em>"
"#,
    );

    let config = Config::load(&path).unwrap();
    assert_eq!(config.index.root, Some(dir.path().join("indexes")));
    assert_eq!(config.index.writer_heap_bytes, 60_000_000);
    assert_eq!(config.index.writer_threads, 2);
    assert_eq!(config.search.limit, 25);
    assert_eq!(config.search.analyzer, "french");
    assert_eq!(config.highlight.max_fragments, 2);
    assert_eq!(config.highlight.fragment_chars, 80);
    assert_eq!(config.highlight.separator, " ... ");
    assert_eq!(config.highlight.pre_tag, "<em>");
    assert_eq!(config.highlight.post_tag, "</em>");
    assert!(config.validate().is_empty());
}

#[test]
fn test_load_empty_file_gives_defaults() {
    let (_dir, path) = write_config("");
    assert_eq!(Config::load(&path).unwrap(), Config::default());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_load_invalid_toml() {
    let (_dir, path) = write_config("[search\nlimit = 3");
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseToml { .. }));
}

#[test]
fn test_loaded_config_reports_warnings() {
    let (_dir, path) = write_config(
        r#"
[index]
writer_heap_bytes = 1000

[search]
analyzer = "elvish"
"#,
    );
    let warnings = Config::load(&path).unwrap().validate();
    assert!(warnings.contains(&ConfigWarning::UnknownAnalyzer {
        name: "elvish".into()
    }));
    assert!(warnings.contains(&ConfigWarning::WriterHeapTooSmall { per_thread: 1000 }));
}

#[test]
fn test_written_settings_load_back() {
    let mut config = Config::default();
    config.search.limit = 7;
    config.highlight.separator = " | ".into();

    let (_dir, path) = write_config(&config.to_toml().unwrap());
    assert_eq!(Config::load(&path).unwrap(), config);
}
