//! Tantivy-based full-text index for wiki content.
//!
//! This crate indexes and searches the pages, discussion messages, page attachments
//! and wiki-level files of many wikis, one index per wiki. It handles:
//! - Document schema and typed document conversion
//! - Text analysis shared by indexing, querying and highlighting
//! - Index storage on disk or in memory, with one writer at a time per index
//! - Multi-field boolean search with BM25 ranking
//! - Highlighted excerpts and typed results
//!
//! # Example
//!
//! ```no_run
//! use wikifind_config::Config;
//! use wikifind_index::{PageContent, SearchEngine, SearchMode};
//!
//! let engine = SearchEngine::in_memory(Config::default()).unwrap();
//! engine
//!     .index_page(&PageContent {
//!         wiki: "root".to_string(),
//!         full_name: "Main.HomePage".to_string(),
//!         title: "Home".to_string(),
//!         content: "Welcome to the wiki".to_string(),
//!     })
//!     .unwrap();
//!
//! let results = engine
//!     .search("root", &[], "welcome", SearchMode::AllWords)
//!     .unwrap();
//! assert_eq!(results.len(), 1);
//! ```

#![warn(missing_docs)]

mod analyzer;
mod document;
mod engine;
mod error;
mod highlight;
mod location;
mod manifest;
mod query;
mod registry;
mod result;
mod schema;
mod search;
mod store;
mod writer;

pub use analyzer::{
    AnalyzedToken, AnalyzerKind, SIMPLE_ANALYZER, WIKI_TOKENIZER, analyze_terms, parse_language,
    tokenize,
};
pub use document::{
    IndexDocument, Message, PageAttachment, PageContent, PageRef, StoredFields, WikiFile,
};
pub use engine::SearchEngine;
pub use error::IndexError;
pub use highlight::Highlighter;
pub use location::{DirectoryLocator, InMemoryLocator, IndexLocation, IndexLocator, escape_wiki_id};
pub use manifest::{IndexManifest, MANIFEST_FILE, SCHEMA_VERSION, manifest_path};
pub use query::QueryCompiler;
pub use registry::IndexRegistry;
pub use result::{
    AttachmentResult, FileResult, MessageResult, PageResult, RELEVANCE_SCALE, ResultDocument,
    SearchResult,
};
pub use schema::{DocumentType, FieldIndexing, FieldSpec, IndexSchema, SearchField};
pub use search::{CompiledSearch, SearchMode};
pub use store::{IndexStore, Snapshot, StoreOptions, StoreWriter};
pub use wikifind_query::{QueryError, QueryErrorKind};
