//! Text analysis pipeline for wiki indexes.
//!
//! The default `simple` analyzer splits on non-alphanumeric boundaries and lower-cases,
//! with no stemming and no stop words:
//! 1. `SimpleTokenizer` - splits on whitespace and punctuation
//! 2. `LowerCaser` - converts tokens to lowercase
//!
//! Tokens are never dropped for length, so long compounds, hashes and unspaced CJK runs
//! stay searchable.
//!
//! A stemming language may be configured instead, which appends a `Stemmer` stage.
//! The same analyzer is used for indexing, query analysis and highlighting.

use std::fmt;

use tantivy::tokenizer::{
    Language, LowerCaser, SimpleTokenizer, Stemmer, TextAnalyzer, TokenStream,
};

use crate::IndexError;

/// Name of the custom tokenizer registered with Tantivy.
pub const WIKI_TOKENIZER: &str = "wiki_text";

/// Name of the non-stemming analyzer.
pub const SIMPLE_ANALYZER: &str = "simple";

/// Stemming languages by configuration name.
const LANGUAGES: &[(&str, Language)] = &[
    ("arabic", Language::Arabic),
    ("danish", Language::Danish),
    ("dutch", Language::Dutch),
    ("english", Language::English),
    ("finnish", Language::Finnish),
    ("french", Language::French),
    ("german", Language::German),
    ("greek", Language::Greek),
    ("hungarian", Language::Hungarian),
    ("italian", Language::Italian),
    ("norwegian", Language::Norwegian),
    ("portuguese", Language::Portuguese),
    ("romanian", Language::Romanian),
    ("russian", Language::Russian),
    ("spanish", Language::Spanish),
    ("swedish", Language::Swedish),
    ("tamil", Language::Tamil),
    ("turkish", Language::Turkish),
];

/// Parses a stemmer language string into a Tantivy `Language`.
pub fn parse_language(name: &str) -> Result<Language, IndexError> {
    let lowered = name.to_lowercase();
    LANGUAGES
        .iter()
        .find(|(candidate, _)| *candidate == lowered)
        .map(|(_, language)| *language)
        .ok_or(IndexError::InvalidLanguage(lowered))
}

/// Which analysis pipeline an index uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyzerKind {
    /// Split, lower-case, no stemming.
    #[default]
    Simple,
    /// Split, lower-case, then stem for the given language.
    Stemmed(Language),
}

impl AnalyzerKind {
    /// Resolves a configured analyzer name (`simple` or a language name).
    pub fn from_name(name: &str) -> Result<Self, IndexError> {
        if name.eq_ignore_ascii_case(SIMPLE_ANALYZER) {
            return Ok(Self::Simple);
        }
        parse_language(name).map(Self::Stemmed)
    }

    /// Canonical name recorded in the index manifest.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple => SIMPLE_ANALYZER,
            Self::Stemmed(language) => LANGUAGES
                .iter()
                .find(|(_, candidate)| candidate == language)
                .map_or("unknown", |(name, _)| name),
        }
    }

    /// Builds the Tantivy analyzer for this pipeline.
    pub fn build(&self) -> TextAnalyzer {
        let builder = TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser);
        match self {
            Self::Simple => builder.build(),
            Self::Stemmed(language) => builder.filter(Stemmer::new(*language)).build(),
        }
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single analyzed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedToken {
    /// Normalized term as stored in the index.
    pub term: String,
    /// Token position within the text.
    pub position: usize,
    /// Byte offset where the token starts in the source text.
    pub offset_from: usize,
    /// Byte offset one past the token's end in the source text.
    pub offset_to: usize,
}

/// Runs `text` through `analyzer`, returning terms in order with their positions and offsets.
pub fn tokenize(analyzer: &mut TextAnalyzer, text: &str) -> Vec<AnalyzedToken> {
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while stream.advance() {
        let token = stream.token();
        tokens.push(AnalyzedToken {
            term: token.text.clone(),
            position: token.position,
            offset_from: token.offset_from,
            offset_to: token.offset_to,
        });
    }
    tokens
}

/// Convenience wrapper returning only the analyzed terms.
pub fn analyze_terms(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    tokenize(analyzer, text)
        .into_iter()
        .map(|token| token.term)
        .collect()
}
