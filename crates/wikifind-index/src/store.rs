//! Per-wiki index storage.
//!
//! An [`IndexStore`] owns one Tantivy index together with a reader that is reloaded
//! after every commit. Writes go through a [`StoreWriter`], which holds the store's
//! write lock for its whole lifetime; at most one exists per store at a time. Reads
//! go through a [`Snapshot`], a searcher fixed at the moment it was taken.

use std::{fs, path::PathBuf};

use parking_lot::{Mutex, MutexGuard};
use tantivy::{
    DocAddress, Index, IndexReader, IndexWriter as TantivyIndexWriter, ReloadPolicy,
    Searcher, TantivyDocument, TantivyError, Term,
    collector::{Count, TopDocs},
    directory::MmapDirectory,
    query::{BooleanQuery, Occur, Query, TermQuery},
    schema::{Field, IndexRecordOption},
    tokenizer::TextAnalyzer,
};
use tracing::{debug, info};
use wikifind_config::{Config, IndexSettings};

use crate::{
    IndexError,
    analyzer::{AnalyzerKind, WIKI_TOKENIZER},
    document::{IndexDocument, StoredFields},
    location::IndexLocation,
    manifest::IndexManifest,
    schema::{FieldIndexing, IndexSchema, SearchField},
};

/// Tantivy's marker file for an existing index.
const META_FILE: &str = "meta.json";

/// Parameters shared by every store a registry opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Analyzer for tokenized fields.
    pub analyzer: AnalyzerKind,
    /// Writer memory budget in bytes, shared by all writer threads.
    pub writer_heap_bytes: usize,
    /// Number of indexing threads per writer.
    pub writer_threads: usize,
}

impl StoreOptions {
    /// Derives store options from configuration.
    pub fn from_config(config: &Config) -> Result<Self, IndexError> {
        Ok(Self {
            analyzer: AnalyzerKind::from_name(&config.search.analyzer)?,
            writer_heap_bytes: config.index.writer_heap_bytes,
            writer_threads: config.index.writer_threads.max(1),
        })
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        let settings = IndexSettings::default();
        Self {
            analyzer: AnalyzerKind::Simple,
            writer_heap_bytes: settings.writer_heap_bytes,
            writer_threads: settings.writer_threads,
        }
    }
}

/// The index of a single wiki.
pub struct IndexStore {
    /// Wiki whose documents this store holds.
    wiki: String,
    /// Where the index lives.
    location: IndexLocation,
    /// The Tantivy index.
    index: Index,
    /// Reader reloaded after each commit.
    reader: IndexReader,
    /// Schema with field handles.
    schema: IndexSchema,
    /// Store parameters.
    options: StoreOptions,
    /// Write lock. The flag records that the store has been destroyed.
    write_lock: Mutex<bool>,
}

impl IndexStore {
    /// Opens the index at `location`, returning `None` if none exists yet.
    pub fn open(
        wiki: &str,
        location: IndexLocation,
        options: StoreOptions,
    ) -> Result<Option<Self>, IndexError> {
        if !Self::exists(&location) {
            return Ok(None);
        }
        Self::open_or_create(wiki, location, options).map(Some)
    }

    /// Opens the index at `location`, creating an empty one if needed.
    pub fn open_or_create(
        wiki: &str,
        location: IndexLocation,
        options: StoreOptions,
    ) -> Result<Self, IndexError> {
        let schema = IndexSchema::new();
        let index = match &location {
            IndexLocation::Directory(path) => {
                fs::create_dir_all(path)?;
                let dir = MmapDirectory::open(path).map_err(|e| {
                    let err: TantivyError = e.into();
                    IndexError::storage(path.clone(), &err)
                })?;
                Index::open_or_create(dir, schema.schema().clone()).map_err(|e| match e {
                    TantivyError::SchemaError(message) => IndexError::SchemaMismatch(message),
                    other => IndexError::storage(path.clone(), &other),
                })?
            }
            IndexLocation::InMemory => Index::create_in_ram(schema.schema().clone()),
        };

        index
            .tokenizers()
            .register(WIKI_TOKENIZER, options.analyzer.build());

        if let IndexLocation::Directory(path) = &location {
            let expected = IndexManifest::new(options.analyzer);
            match IndexManifest::load(path)? {
                Some(stored) => stored.check(&expected)?,
                None => {
                    expected.save(path)?;
                    info!(
                        wiki,
                        path = %path.display(),
                        analyzer = %expected.analyzer,
                        "created index"
                    );
                }
            }
        }

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| IndexError::storage(location.display_path(), &e))?;

        Ok(Self {
            wiki: wiki.to_string(),
            location,
            index,
            reader,
            schema,
            options,
            write_lock: Mutex::new(false),
        })
    }

    /// Returns true if an index has been created at `location`.
    ///
    /// In-memory indexes only exist as live stores, so this is always false for them.
    pub fn exists(location: &IndexLocation) -> bool {
        match location {
            IndexLocation::Directory(path) => path.join(META_FILE).is_file(),
            IndexLocation::InMemory => false,
        }
    }

    /// Wiki whose documents this store holds.
    pub fn wiki(&self) -> &str {
        &self.wiki
    }

    /// Where the index lives.
    pub fn location(&self) -> &IndexLocation {
        &self.location
    }

    /// Schema with field handles.
    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    /// Which analyzer the index uses.
    pub fn analyzer_kind(&self) -> AnalyzerKind {
        self.options.analyzer
    }

    /// A fresh instance of the index's analyzer.
    pub fn analyzer(&self) -> TextAnalyzer {
        self.options.analyzer.build()
    }

    /// Acquires the write lock and opens a writer.
    ///
    /// Blocks while another writer is open on this store. Changes become visible only
    /// after [`StoreWriter::commit`]; dropping the writer discards them.
    pub fn writer(&self) -> Result<StoreWriter<'_>, IndexError> {
        let guard = self.write_lock.lock();
        if *guard {
            return Err(IndexError::StorageUnavailable {
                path: self.location.display_path(),
                message: "index has been deleted".to_string(),
            });
        }
        let writer = self
            .index
            .writer_with_num_threads(self.options.writer_threads, self.options.writer_heap_bytes)
            .map_err(|e| IndexError::storage(self.location.display_path(), &e))?;
        Ok(StoreWriter {
            store: self,
            _guard: guard,
            writer,
            pending: 0,
        })
    }

    /// Takes a read snapshot of the last committed state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            searcher: self.reader.searcher(),
            schema: self.schema.clone(),
            path: self.location.display_path(),
        }
    }

    /// Number of committed documents.
    pub fn document_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Deletes the index's files and refuses further writes.
    ///
    /// Waits for any open writer to finish first. Snapshots already taken stay readable.
    pub fn destroy(&self) -> Result<(), IndexError> {
        let mut destroyed = self.write_lock.lock();
        if *destroyed {
            return Ok(());
        }
        *destroyed = true;
        if let IndexLocation::Directory(path) = &self.location {
            if path.exists() {
                fs::remove_dir_all(path)?;
            }
        }
        info!(wiki = %self.wiki, path = %self.location.display_path().display(), "deleted index");
        Ok(())
    }

    /// Deletes the index at `location` without opening it.
    ///
    /// Works for indexes this build cannot open, such as one built with another
    /// analyzer. Returns false if there was no index.
    pub fn destroy_unopened(wiki: &str, location: &IndexLocation) -> Result<bool, IndexError> {
        let IndexLocation::Directory(path) = location else {
            return Ok(false);
        };
        let existed = Self::exists(location);
        if path.exists() {
            fs::remove_dir_all(path)?;
        }
        if existed {
            info!(wiki, path = %path.display(), "deleted index");
        }
        Ok(existed)
    }
}

/// Exclusive writer on an [`IndexStore`].
///
/// Releases the store's write lock when dropped, committed or not.
pub struct StoreWriter<'a> {
    /// Store being written.
    store: &'a IndexStore,
    /// Held for the writer's lifetime.
    _guard: MutexGuard<'a, bool>,
    /// The underlying Tantivy writer.
    writer: TantivyIndexWriter,
    /// Number of uncommitted operations.
    pending: usize,
}

impl StoreWriter<'_> {
    /// Stages a document for addition.
    pub fn add(&mut self, document: &IndexDocument) -> Result<(), IndexError> {
        if document.wiki() != self.store.wiki {
            return Err(IndexError::IndexWriteFailed(format!(
                "document of wiki '{}' cannot be written to the index of wiki '{}'",
                document.wiki(),
                self.store.wiki
            )));
        }
        self.writer
            .add_document(document.to_tantivy(&self.store.schema))
            .map_err(|e| IndexError::write(&e))?;
        self.pending += 1;
        Ok(())
    }

    /// Stages deletion of every document whose exact-match fields equal the given values.
    pub fn delete_matching(&mut self, clauses: &[(SearchField, &str)]) -> Result<(), IndexError> {
        match clauses {
            [(field, value)] => {
                let field = exact_field(&self.store.schema, *field)?;
                self.writer.delete_term(Term::from_field_text(field, value));
            }
            _ => {
                let query = exact_match_query(&self.store.schema, clauses)?;
                self.writer
                    .delete_query(query)
                    .map_err(|e| IndexError::write(&e))?;
            }
        }
        self.pending += 1;
        Ok(())
    }

    /// Stages deletion of every document.
    pub fn delete_all(&mut self) -> Result<(), IndexError> {
        self.writer
            .delete_all_documents()
            .map_err(|e| IndexError::write(&e))?;
        self.pending += 1;
        Ok(())
    }

    /// Number of staged operations.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Commits staged changes and reloads the store's reader.
    ///
    /// Once this returns, every snapshot taken afterwards observes the changes.
    pub fn commit(mut self) -> Result<(), IndexError> {
        self.writer.commit().map_err(|e| IndexError::write(&e))?;
        self.store
            .reader
            .reload()
            .map_err(|e| IndexError::storage(self.store.location.display_path(), &e))?;
        debug!(wiki = %self.store.wiki, operations = self.pending, "committed");
        self.writer
            .wait_merging_threads()
            .map_err(|e| IndexError::write(&e))
    }
}

/// A read view of an index fixed at the moment it was taken.
pub struct Snapshot {
    /// Tantivy searcher pinned to a set of segments.
    searcher: Searcher,
    /// Schema with field handles.
    schema: IndexSchema,
    /// Index location for error messages.
    path: PathBuf,
}

impl Snapshot {
    /// Runs `query`, returning at most `limit` hits in descending score order.
    ///
    /// Addresses are only valid within this snapshot.
    pub fn iterate_matches(
        &self,
        query: &dyn Query,
        limit: usize,
    ) -> Result<Vec<(DocAddress, f32)>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let hits = self
            .searcher
            .search(query, &TopDocs::with_limit(limit))
            .map_err(|e| IndexError::storage(self.path.clone(), &e))?;
        Ok(hits
            .into_iter()
            .map(|(score, address)| (address, score))
            .collect())
    }

    /// Counts documents matching `query`.
    pub fn count(&self, query: &dyn Query) -> Result<usize, IndexError> {
        self.searcher
            .search(query, &Count)
            .map_err(|e| IndexError::storage(self.path.clone(), &e))
    }

    /// Counts documents whose exact-match fields equal the given values.
    pub fn count_matching(&self, clauses: &[(SearchField, &str)]) -> Result<usize, IndexError> {
        let query = exact_match_query(&self.schema, clauses)?;
        self.count(query.as_ref())
    }

    /// Loads the stored fields of a hit.
    pub fn stored_fields(&self, address: DocAddress) -> Result<StoredFields, IndexError> {
        let doc: TantivyDocument = self
            .searcher
            .doc(address)
            .map_err(|e| IndexError::storage(self.path.clone(), &e))?;
        Ok(StoredFields::from_tantivy(&doc, &self.schema))
    }

    /// Number of documents visible in this snapshot.
    pub fn num_docs(&self) -> u64 {
        self.searcher.num_docs()
    }

    /// Schema with field handles.
    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }
}

/// Resolves an exact-match field, rejecting tokenized or unindexed ones.
fn exact_field(
    schema: &IndexSchema,
    field: SearchField,
) -> Result<Field, IndexError> {
    if field.indexing() != FieldIndexing::Exact {
        return Err(IndexError::IndexWriteFailed(format!(
            "'{field}' is not an exact-match field"
        )));
    }
    Ok(schema.field(field))
}

/// Conjunction of exact term matches.
fn exact_match_query(
    schema: &IndexSchema,
    clauses: &[(SearchField, &str)],
) -> Result<Box<dyn Query>, IndexError> {
    if clauses.is_empty() {
        return Err(IndexError::IndexWriteFailed(
            "exact match requires at least one clause".to_string(),
        ));
    }
    let subqueries = clauses
        .iter()
        .map(|(field, value)| {
            let field = exact_field(schema, *field)?;
            let term = TermQuery::new(
                Term::from_field_text(field, value),
                IndexRecordOption::Basic,
            );
            Ok((Occur::Must, Box::new(term) as Box<dyn Query>))
        })
        .collect::<Result<Vec<_>, IndexError>>()?;
    Ok(Box::new(BooleanQuery::new(subqueries)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::PageContent;

    fn page(name: &str, content: &str) -> IndexDocument {
        IndexDocument::Page(PageContent {
            wiki: "root".into(),
            full_name: name.into(),
            title: name.into(),
            content: content.into(),
        })
    }

    fn memory_store() -> IndexStore {
        IndexStore::open_or_create("root", IndexLocation::InMemory, StoreOptions::default())
            .unwrap()
    }

    #[test]
    fn commit_makes_documents_visible() {
        let store = memory_store();
        let mut writer = store.writer().unwrap();
        writer.add(&page("Main.A", "alpha")).unwrap();
        writer.add(&page("Main.B", "beta")).unwrap();
        assert_eq!(writer.pending(), 2);
        assert_eq!(store.document_count(), 0);
        writer.commit().unwrap();
        assert_eq!(store.document_count(), 2);
    }

    #[test]
    fn dropped_writer_discards_changes() {
        let store = memory_store();
        {
            let mut writer = store.writer().unwrap();
            writer.add(&page("Main.A", "alpha")).unwrap();
        }
        assert_eq!(store.document_count(), 0);

        let mut writer = store.writer().unwrap();
        writer.add(&page("Main.B", "beta")).unwrap();
        writer.commit().unwrap();
        assert_eq!(store.document_count(), 1);
    }

    #[test]
    fn delete_matching_is_exact() {
        let store = memory_store();
        let mut writer = store.writer().unwrap();
        writer.add(&page("Main.A", "alpha")).unwrap();
        writer.add(&page("main.a", "alpha")).unwrap();
        writer.commit().unwrap();

        let mut writer = store.writer().unwrap();
        writer
            .delete_matching(&[(SearchField::PageFullName, "Main.A")])
            .unwrap();
        writer.commit().unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.num_docs(), 1);
        assert_eq!(
            snapshot
                .count_matching(&[(SearchField::PageFullName, "main.a")])
                .unwrap(),
            1
        );
    }

    #[test]
    fn delete_matching_rejects_tokenized_fields() {
        let store = memory_store();
        let mut writer = store.writer().unwrap();
        let err = writer
            .delete_matching(&[(SearchField::Title, "alpha")])
            .unwrap_err();
        assert!(matches!(err, IndexError::IndexWriteFailed(_)));
        assert!(writer.delete_matching(&[]).is_err());
    }

    #[test]
    fn rejects_documents_of_other_wikis() {
        let store = memory_store();
        let mut writer = store.writer().unwrap();
        let doc = IndexDocument::Page(PageContent {
            wiki: "other".into(),
            full_name: "Main.A".into(),
            title: "A".into(),
            content: "alpha".into(),
        });
        assert!(matches!(
            writer.add(&doc),
            Err(IndexError::IndexWriteFailed(_))
        ));
    }

    #[test]
    fn snapshot_ignores_later_commits() {
        let store = memory_store();
        let mut writer = store.writer().unwrap();
        writer.add(&page("Main.A", "alpha")).unwrap();
        writer.commit().unwrap();

        let snapshot = store.snapshot();
        let mut writer = store.writer().unwrap();
        writer.add(&page("Main.B", "beta")).unwrap();
        writer.commit().unwrap();

        assert_eq!(snapshot.num_docs(), 1);
        assert_eq!(store.snapshot().num_docs(), 2);
    }

    #[test]
    fn stored_fields_come_back() {
        let store = memory_store();
        let mut writer = store.writer().unwrap();
        writer.add(&page("Main.A", "alpha text")).unwrap();
        writer.commit().unwrap();

        let snapshot = store.snapshot();
        let query = exact_match_query(store.schema(), &[(SearchField::Wiki, "root")]).unwrap();
        let hits = snapshot.iterate_matches(query.as_ref(), 10).unwrap();
        assert_eq!(hits.len(), 1);
        let stored = snapshot.stored_fields(hits[0].0).unwrap();
        assert_eq!(stored.get(SearchField::Content), Some("alpha text"));
        assert!(snapshot.iterate_matches(query.as_ref(), 0).unwrap().is_empty());
    }

    #[test]
    fn on_disk_store_reopens_with_documents() {
        let dir = tempfile::tempdir().unwrap();
        let location = IndexLocation::Directory(dir.path().join("root"));
        assert!(
            IndexStore::open("root", location.clone(), StoreOptions::default())
                .unwrap()
                .is_none()
        );

        {
            let store =
                IndexStore::open_or_create("root", location.clone(), StoreOptions::default())
                    .unwrap();
            let mut writer = store.writer().unwrap();
            writer.add(&page("Main.A", "alpha")).unwrap();
            writer.commit().unwrap();
        }

        assert!(IndexStore::exists(&location));
        let store = IndexStore::open("root", location, StoreOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(store.document_count(), 1);
    }

    #[test]
    fn reopening_with_other_analyzer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let location = IndexLocation::Directory(dir.path().join("root"));
        drop(
            IndexStore::open_or_create("root", location.clone(), StoreOptions::default()).unwrap(),
        );

        let options = StoreOptions {
            analyzer: AnalyzerKind::from_name("english").unwrap(),
            ..StoreOptions::default()
        };
        let err = IndexStore::open_or_create("root", location, options)
            .err()
            .unwrap();
        assert!(matches!(err, IndexError::SchemaMismatch(_)));
    }

    #[test]
    fn destroy_removes_files_and_blocks_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("root");
        let store = IndexStore::open_or_create(
            "root",
            IndexLocation::Directory(path.clone()),
            StoreOptions::default(),
        )
        .unwrap();
        store.destroy().unwrap();
        assert!(!path.exists());
        assert!(matches!(
            store.writer().err().unwrap(),
            IndexError::StorageUnavailable { .. }
        ));
        store.destroy().unwrap();
    }
}
