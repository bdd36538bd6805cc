//! Fragment highlighting.
//!
//! Picks the best excerpts of a stored text for a set of query terms and wraps each
//! matched term in markers. The text is re-tokenized with the index's analyzer, so a
//! term is marked exactly when it would have matched at search time.

use std::{collections::HashSet, ops::Range};

use tantivy::tokenizer::TextAnalyzer;
use wikifind_config::HighlightSettings;

use crate::analyzer::{AnalyzedToken, tokenize};

/// Produces highlighted fragments for one query.
#[derive(Clone)]
pub struct Highlighter {
    /// Analyzer shared with the index.
    analyzer: TextAnalyzer,
    /// Analyzed query terms to mark.
    terms: HashSet<String>,
    /// Fragment sizing and markers.
    settings: HighlightSettings,
}

/// A candidate excerpt: a run of consecutive tokens.
struct Window {
    /// Index of the first token.
    first: usize,
    /// Index one past the last token.
    last: usize,
    /// Number of distinct query terms in the window.
    distinct: usize,
    /// Number of query term occurrences in the window.
    occurrences: usize,
}

impl Highlighter {
    /// Creates a highlighter for the given query words.
    ///
    /// Words are analyzed the same way as the indexed text.
    pub fn new<'a, I>(mut analyzer: TextAnalyzer, words: I, settings: HighlightSettings) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let terms = words
            .into_iter()
            .flat_map(|word| tokenize(&mut analyzer, word))
            .map(|token| token.term)
            .collect();
        Self {
            analyzer,
            terms,
            settings,
        }
    }

    /// Returns true if there is nothing to highlight.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns up to `max_fragments` excerpts of `text` in document order.
    ///
    /// Each excerpt spans at most `fragment_chars` characters. Empty text, or text
    /// without any query term, yields no fragments.
    pub fn best_fragments(&self, text: &str) -> Vec<String> {
        if text.is_empty() || self.terms.is_empty() || self.settings.max_fragments == 0 {
            return Vec::new();
        }

        let mut analyzer = self.analyzer.clone();
        let tokens = tokenize(&mut analyzer, text);
        let mut windows = self.windows(text, &tokens);

        windows.retain(|window| window.occurrences > 0);
        windows.sort_by(|a, b| {
            b.distinct
                .cmp(&a.distinct)
                .then(b.occurrences.cmp(&a.occurrences))
                .then(a.first.cmp(&b.first))
        });
        windows.truncate(self.settings.max_fragments);
        windows.sort_by_key(|window| window.first);

        windows
            .iter()
            .map(|window| self.render(text, &tokens[window.first..window.last]))
            .collect()
    }

    /// Returns the best fragments joined by the separator.
    pub fn joined(&self, text: &str) -> String {
        self.best_fragments(text).join(&self.settings.separator)
    }

    /// Splits the tokens into consecutive windows of at most `fragment_chars` characters.
    fn windows(&self, text: &str, tokens: &[AnalyzedToken]) -> Vec<Window> {
        let mut windows = Vec::new();
        let mut first = 0;

        while first < tokens.len() {
            let start = tokens[first].offset_from;
            let mut last = first + 1;
            while last < tokens.len()
                && text[start..tokens[last].offset_to].chars().count()
                    <= self.settings.fragment_chars
            {
                last += 1;
            }

            let matched: Vec<&str> = tokens[first..last]
                .iter()
                .filter(|token| self.terms.contains(&token.term))
                .map(|token| token.term.as_str())
                .collect();
            let distinct: HashSet<&str> = matched.iter().copied().collect();

            windows.push(Window {
                first,
                last,
                distinct: distinct.len(),
                occurrences: matched.len(),
            });
            first = last;
        }

        windows
    }

    /// Renders the text spanned by `tokens` with matched terms wrapped in markers.
    fn render(&self, text: &str, tokens: &[AnalyzedToken]) -> String {
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            return String::new();
        };
        let span = first.offset_from..last.offset_to;

        let matches = merge_ranges(
            tokens
                .iter()
                .filter(|token| self.terms.contains(&token.term))
                .map(|token| token.offset_from..token.offset_to)
                .collect(),
        );

        let mut out = String::with_capacity(span.len() + matches.len() * 32);
        let mut cursor = span.start;
        for range in matches {
            out.push_str(&text[cursor..range.start]);
            out.push_str(&self.settings.pre_tag);
            out.push_str(&text[range.clone()]);
            out.push_str(&self.settings.post_tag);
            cursor = range.end;
        }
        out.push_str(&text[cursor..span.end]);
        out
    }
}

/// Sorts byte ranges and combines overlapping ones.
fn merge_ranges(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|r| r.start);

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(current) if range.start <= current.end => {
                current.end = current.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}
