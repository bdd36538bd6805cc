//! Configuration validation.
//!
//! Reports settings that load fine but would make the engine misbehave.

use std::fmt;

use crate::Config;

/// Analyzer names the index understands.
pub const KNOWN_ANALYZERS: &[&str] = &[
    "simple",
    "arabic",
    "danish",
    "dutch",
    "english",
    "finnish",
    "french",
    "german",
    "greek",
    "hungarian",
    "italian",
    "norwegian",
    "portuguese",
    "romanian",
    "russian",
    "spanish",
    "swedish",
    "tamil",
    "turkish",
];

/// Smallest writer memory budget the index accepts per indexing thread.
pub const MIN_WRITER_HEAP_PER_THREAD: usize = 15_000_000;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// The result limit is zero, so every search returns nothing.
    ZeroResultLimit,
    /// No fragments will ever be produced.
    ZeroFragments,
    /// Fragments cannot hold any text.
    ZeroFragmentChars,
    /// Writers are configured with no indexing threads.
    ZeroWriterThreads,
    /// The per-thread writer budget is below what the index accepts.
    WriterHeapTooSmall {
        /// Budget per thread after dividing the configured heap.
        per_thread: usize,
    },
    /// The analyzer name is not recognized.
    UnknownAnalyzer {
        /// The configured name.
        name: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroResultLimit => write!(f, "search.limit is 0; searches return no results"),
            Self::ZeroFragments => {
                write!(f, "highlight.max_fragments is 0; no excerpts will be produced")
            }
            Self::ZeroFragmentChars => write!(f, "highlight.fragment_chars is 0"),
            Self::ZeroWriterThreads => write!(f, "index.writer_threads is 0"),
            Self::WriterHeapTooSmall { per_thread } => write!(
                f,
                "index.writer_heap_bytes gives {per_thread} bytes per thread, \
                 minimum is {MIN_WRITER_HEAP_PER_THREAD}"
            ),
            Self::UnknownAnalyzer { name } => write!(f, "unknown analyzer '{name}'"),
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.search.limit == 0 {
        warnings.push(ConfigWarning::ZeroResultLimit);
    }

    let analyzer = config.search.analyzer.to_lowercase();
    if !KNOWN_ANALYZERS.contains(&analyzer.as_str()) {
        warnings.push(ConfigWarning::UnknownAnalyzer {
            name: config.search.analyzer.clone(),
        });
    }

    if config.highlight.max_fragments == 0 {
        warnings.push(ConfigWarning::ZeroFragments);
    }
    if config.highlight.fragment_chars == 0 {
        warnings.push(ConfigWarning::ZeroFragmentChars);
    }

    match config.index.writer_threads {
        0 => warnings.push(ConfigWarning::ZeroWriterThreads),
        threads => {
            let per_thread = config.index.writer_heap_bytes / threads;
            if per_thread < MIN_WRITER_HEAP_PER_THREAD {
                warnings.push(ConfigWarning::WriterHeapTooSmall { per_thread });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_clean() {
        assert!(validate_config(&Config::default()).is_empty());
    }

    #[test]
    fn reports_each_problem() {
        let mut config = Config::default();
        config.search.limit = 0;
        config.search.analyzer = "klingon".into();
        config.highlight.max_fragments = 0;
        config.index.writer_threads = 4;

        let warnings = validate_config(&config);
        assert_eq!(
            warnings,
            vec![
                ConfigWarning::ZeroResultLimit,
                ConfigWarning::UnknownAnalyzer {
                    name: "klingon".into()
                },
                ConfigWarning::ZeroFragments,
                ConfigWarning::WriterHeapTooSmall {
                    per_thread: 12_500_000
                },
            ]
        );
    }

    #[test]
    fn analyzer_names_are_case_insensitive() {
        let mut config = Config::default();
        config.search.analyzer = "English".into();
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn zero_threads_reported_once() {
        let mut config = Config::default();
        config.index.writer_threads = 0;
        assert_eq!(validate_config(&config), vec![ConfigWarning::ZeroWriterThreads]);
    }

    #[test]
    fn warnings_render_readably() {
        let warning = ConfigWarning::WriterHeapTooSmall {
            per_thread: 1_000,
        };
        assert!(warning.to_string().contains("minimum is 15000000"));
    }
}
