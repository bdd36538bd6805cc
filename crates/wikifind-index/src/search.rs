//! Search execution.
//!
//! Parses a phrase, compiles it against the requested fields, runs it on a snapshot
//! and assembles typed, highlighted results from that same snapshot.

use tantivy::{DocAddress, query::Query, tokenizer::TextAnalyzer};
use tracing::debug;
use wikifind_config::HighlightSettings;
use wikifind_query::{DefaultOperator, parse};

use crate::{
    IndexError,
    highlight::Highlighter,
    query::QueryCompiler,
    result::SearchResult,
    schema::{FieldIndexing, IndexSchema, SearchField},
    store::{IndexStore, Snapshot},
};

/// How bare words in a phrase are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Every word must match.
    #[default]
    AllWords,
    /// At least one word must match.
    AtLeastOneWord,
}

impl SearchMode {
    /// Operator joining adjacent clauses that have no explicit `AND`/`OR`.
    pub fn default_operator(self) -> DefaultOperator {
        match self {
            Self::AllWords => DefaultOperator::And,
            Self::AtLeastOneWord => DefaultOperator::Or,
        }
    }
}

/// A phrase compiled for execution.
pub struct CompiledSearch {
    /// The Tantivy query.
    query: Box<dyn Query>,
    /// Words to highlight in results.
    words: Vec<String>,
}

impl CompiledSearch {
    /// Parses and compiles `phrase` against `fields`.
    ///
    /// An empty field list searches title and content. Returns `None` when the phrase
    /// contains nothing searchable.
    pub fn new(
        schema: &IndexSchema,
        analyzer: TextAnalyzer,
        fields: &[SearchField],
        phrase: &str,
        mode: SearchMode,
    ) -> Result<Option<Self>, IndexError> {
        let fields: &[SearchField] = if fields.is_empty() {
            &SearchField::DEFAULT_SEARCH
        } else {
            fields
        };

        let Some(expr) = parse(phrase, mode.default_operator())? else {
            return Ok(None);
        };
        let mut compiler = QueryCompiler::new(schema.clone(), analyzer, fields)
            .map_err(|err| err.with_query(phrase))?;
        let Some(query) = compiler
            .compile(&expr)
            .map_err(|err| err.with_query(phrase))?
        else {
            return Ok(None);
        };

        let tokenized = |field: SearchField| field.indexing() == FieldIndexing::Tokenized;
        let default_tokenized = fields.iter().copied().any(tokenized);
        let words = expr
            .positive_words_where(|field| match field {
                None => default_tokenized,
                Some(name) => SearchField::from_name(name).is_some_and(tokenized),
            })
            .into_iter()
            .map(str::to_string)
            .collect();

        Ok(Some(Self { query, words }))
    }

    /// The compiled Tantivy query.
    pub fn query(&self) -> &dyn Query {
        self.query.as_ref()
    }

    /// Words a highlighter should mark: positive words searched in tokenized fields.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl Snapshot {
    /// Runs a phrase search, returning at most `limit` hits in descending score order.
    pub fn search(
        &self,
        analyzer: TextAnalyzer,
        fields: &[SearchField],
        phrase: &str,
        mode: SearchMode,
        limit: usize,
    ) -> Result<Vec<(DocAddress, f32)>, IndexError> {
        match CompiledSearch::new(self.schema(), analyzer, fields, phrase, mode)? {
            Some(search) => self.iterate_matches(search.query(), limit),
            None => Ok(Vec::new()),
        }
    }
}

impl IndexStore {
    /// Searches the index and assembles highlighted results.
    ///
    /// All hits are read from one snapshot, so a commit landing mid-query is not
    /// observed. Results are capped at `limit`; extra matches are dropped silently.
    pub fn search(
        &self,
        fields: &[SearchField],
        phrase: &str,
        mode: SearchMode,
        limit: usize,
        highlight: &HighlightSettings,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let snapshot = self.snapshot();
        let Some(search) =
            CompiledSearch::new(snapshot.schema(), self.analyzer(), fields, phrase, mode)?
        else {
            debug!(wiki = %self.wiki(), phrase, "nothing to search");
            return Ok(Vec::new());
        };

        let hits = snapshot.iterate_matches(search.query(), limit)?;
        let highlighter = Highlighter::new(self.analyzer(), search.words(), highlight.clone());
        let results = hits
            .into_iter()
            .map(|(address, score)| {
                let stored = snapshot.stored_fields(address)?;
                SearchResult::assemble(&stored, score, &highlighter)
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        debug!(wiki = %self.wiki(), phrase, ?mode, hits = results.len(), "searched");
        Ok(results)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        document::PageContent, location::IndexLocation, result::ResultDocument,
        store::StoreOptions,
    };

    fn store() -> IndexStore {
        let store =
            IndexStore::open_or_create("root", IndexLocation::InMemory, StoreOptions::default())
                .unwrap();
        for (name, content) in [
            ("Main.One", "apple banana"),
            ("Main.Two", "apple apple apple cherry"),
            ("Main.Three", "cherry durian"),
        ] {
            store
                .index_page(&PageContent {
                    wiki: "root".into(),
                    full_name: name.into(),
                    title: name.into(),
                    content: content.into(),
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn empty_phrase_has_no_results() {
        let store = store();
        let settings = HighlightSettings::default();
        assert!(
            store
                .search(&[], "", SearchMode::AllWords, 100, &settings)
                .unwrap()
                .is_empty()
        );
        assert!(
            store
                .search(&[], "  ...  ", SearchMode::AllWords, 100, &settings)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn relevance_is_non_increasing() {
        let store = store();
        let results = store
            .search(
                &[],
                "apple cherry",
                SearchMode::AtLeastOneWord,
                100,
                &HighlightSettings::default(),
            )
            .unwrap();
        assert_eq!(results.len(), 3);
        for pair in results.windows(2) {
            assert!(pair[0].relevance >= pair[1].relevance);
        }
        assert!(results.iter().all(|r| r.relevance > 0.0));
        assert_eq!(results[0].page_full_name(), Some("Main.Two"));
    }

    #[test]
    fn limit_truncates_silently() {
        let store = store();
        let settings = HighlightSettings::default();
        let results = store
            .search(&[], "apple cherry", SearchMode::AtLeastOneWord, 2, &settings)
            .unwrap();
        assert_eq!(results.len(), 2);
        let none = store
            .search(&[], "apple", SearchMode::AllWords, 0, &settings)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn malformed_phrase_is_query_error() {
        let store = store();
        let err = store
            .search(
                &[],
                "(apple",
                SearchMode::AllWords,
                100,
                &HighlightSettings::default(),
            )
            .unwrap_err();
        let IndexError::QueryParse(query_error) = err else {
            panic!("expected a query error");
        };
        assert_eq!(query_error.query.as_deref(), Some("(apple"));
    }

    #[test]
    fn snapshot_search_returns_addresses() {
        let store = store();
        let snapshot = store.snapshot();
        let hits = snapshot
            .search(
                store.analyzer(),
                &[SearchField::Content],
                "durian",
                SearchMode::AllWords,
                10,
            )
            .unwrap();
        assert_eq!(hits.len(), 1);
        let stored = snapshot.stored_fields(hits[0].0).unwrap();
        assert_eq!(stored.get(SearchField::PageFullName), Some("Main.Three"));
    }

    #[test]
    fn exact_field_words_are_not_highlighted() {
        let store = store();
        let results = store
            .search(
                &[],
                "page_full_name:Main.Two apple",
                SearchMode::AllWords,
                100,
                &HighlightSettings::default(),
            )
            .unwrap();
        assert_eq!(results.len(), 1);
        let ResultDocument::Page(page) = &results[0].document else {
            panic!("expected a page");
        };
        assert_eq!(page.page_full_name, "Main.Two");
        assert!(page.highlighted_title.is_empty());
        assert!(page.highlighted_content[0].contains(">apple</b>"));

        let by_id = CompiledSearch::new(
            store.schema(),
            store.analyzer(),
            &[SearchField::MessageId],
            "1",
            SearchMode::AllWords,
        )
        .unwrap()
        .unwrap();
        assert_eq!(by_id.words().count(), 0);
    }

    #[test]
    fn mode_maps_to_operator() {
        assert_eq!(SearchMode::AllWords.default_operator(), DefaultOperator::And);
        assert_eq!(
            SearchMode::AtLeastOneWord.default_operator(),
            DefaultOperator::Or
        );
        assert_eq!(SearchMode::default(), SearchMode::AllWords);
    }
}
