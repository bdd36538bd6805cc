//! The public search engine.
//!
//! [`SearchEngine`] ties configuration, location resolution and the per-wiki store
//! registry together. It holds no global state; the host application creates one and
//! shares it by reference (it is `Send + Sync`).

use tracing::warn;
use wikifind_config::Config;

use crate::{
    IndexError,
    document::{IndexDocument, Message, PageAttachment, PageContent, PageRef, WikiFile},
    location::{DirectoryLocator, InMemoryLocator, IndexLocator},
    registry::IndexRegistry,
    result::SearchResult,
    schema::SearchField,
    search::SearchMode,
    store::StoreOptions,
};

/// Full-text search over the pages, messages and files of many wikis.
pub struct SearchEngine {
    /// Effective configuration.
    config: Config,
    /// Open stores by wiki.
    registry: IndexRegistry,
}

impl SearchEngine {
    /// Creates an engine storing indexes under the configured root.
    pub fn new(config: Config) -> Result<Self, IndexError> {
        let locator = DirectoryLocator::from_settings(&config.index)?;
        Self::with_locator(config, locator)
    }

    /// Creates an engine keeping every index in memory.
    pub fn in_memory(config: Config) -> Result<Self, IndexError> {
        Self::with_locator(config, InMemoryLocator)
    }

    /// Creates an engine with a custom index locator.
    pub fn with_locator(
        config: Config,
        locator: impl IndexLocator + 'static,
    ) -> Result<Self, IndexError> {
        for warning in config.validate() {
            warn!(%warning, "configuration warning");
        }
        let options = StoreOptions::from_config(&config)?;
        Ok(Self {
            registry: IndexRegistry::new(locator, options),
            config,
        })
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The per-wiki store registry.
    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Searches `wiki` for `phrase` in `fields` (title and content when empty).
    ///
    /// Returns at most the configured limit of results, best first. A wiki without
    /// an index has no results.
    pub fn search(
        &self,
        wiki: &str,
        fields: &[SearchField],
        phrase: &str,
        mode: SearchMode,
    ) -> Result<Vec<SearchResult>, IndexError> {
        match self.registry.get(wiki)? {
            Some(store) => store.search(
                fields,
                phrase,
                mode,
                self.config.search.limit,
                &self.config.highlight,
            ),
            None => Ok(Vec::new()),
        }
    }

    /// Indexes a page.
    pub fn index_page(&self, page: &PageContent) -> Result<(), IndexError> {
        self.registry.get_or_create(&page.wiki)?.index_page(page)
    }

    /// Indexes a message posted on `page`.
    pub fn index_message(&self, message: &Message, page: &PageRef) -> Result<(), IndexError> {
        self.registry
            .get_or_create(&page.wiki)?
            .index_message(message, page)
    }

    /// Indexes an attachment of `page`.
    pub fn index_attachment(
        &self,
        attachment: &PageAttachment,
        page: &PageRef,
    ) -> Result<(), IndexError> {
        self.registry
            .get_or_create(&page.wiki)?
            .index_attachment(attachment, page)
    }

    /// Indexes a wiki-level file.
    pub fn index_file(&self, file: &WikiFile) -> Result<(), IndexError> {
        self.registry.get_or_create(&file.wiki)?.index_file(file)
    }

    /// Removes a page together with its messages and attachments.
    pub fn unindex_page(&self, page: &PageRef) -> Result<(), IndexError> {
        match self.registry.get(&page.wiki)? {
            Some(store) => store.unindex_page(page),
            None => Ok(()),
        }
    }

    /// Removes one message of `page`.
    pub fn unindex_message(&self, message_id: u64, page: &PageRef) -> Result<(), IndexError> {
        match self.registry.get(&page.wiki)? {
            Some(store) => store.unindex_message(message_id, page),
            None => Ok(()),
        }
    }

    /// Removes one attachment of `page`.
    pub fn unindex_attachment(&self, file_name: &str, page: &PageRef) -> Result<(), IndexError> {
        match self.registry.get(&page.wiki)? {
            Some(store) => store.unindex_attachment(file_name, page),
            None => Ok(()),
        }
    }

    /// Removes a wiki-level file.
    pub fn unindex_file(&self, wiki: &str, full_name: &str) -> Result<(), IndexError> {
        match self.registry.get(wiki)? {
            Some(store) => store.unindex_file(full_name),
            None => Ok(()),
        }
    }

    /// Re-indexes a page under a new name, dropping everything under the old one.
    pub fn rename_page(&self, old_full_name: &str, page: &PageContent) -> Result<(), IndexError> {
        self.registry
            .get_or_create(&page.wiki)?
            .rename_page(old_full_name, page)
    }

    /// Replaces the whole index of `wiki` with `documents`.
    pub fn rebuild<I>(&self, wiki: &str, documents: I) -> Result<usize, IndexError>
    where
        I: IntoIterator<Item = IndexDocument>,
    {
        self.registry.get_or_create(wiki)?.rebuild(documents)
    }

    /// Number of documents indexed for `wiki`.
    pub fn document_count(&self, wiki: &str) -> Result<u64, IndexError> {
        Ok(self
            .registry
            .get(wiki)?
            .map_or(0, |store| store.document_count()))
    }

    /// Deletes the index of `wiki`. Returns false if it had none.
    pub fn delete_wiki(&self, wiki: &str) -> Result<bool, IndexError> {
        self.registry.remove(wiki)
    }
}
