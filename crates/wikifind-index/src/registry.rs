//! Registry of open per-wiki stores.
//!
//! Stores are opened on first use and kept for the registry's lifetime. Lookups for
//! reading never create an index; only writes do.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::{
    IndexError,
    location::IndexLocator,
    store::{IndexStore, StoreOptions},
};

/// Owns the open [`IndexStore`] of each wiki.
pub struct IndexRegistry {
    /// Resolves where each wiki's index lives.
    locator: Box<dyn IndexLocator>,
    /// Options applied to every store.
    options: StoreOptions,
    /// Open stores by wiki id.
    stores: RwLock<HashMap<String, Arc<IndexStore>>>,
}

impl IndexRegistry {
    /// Creates an empty registry.
    pub fn new(locator: impl IndexLocator + 'static, options: StoreOptions) -> Self {
        Self {
            locator: Box::new(locator),
            options,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the store of `wiki` if its index exists.
    pub fn get(&self, wiki: &str) -> Result<Option<Arc<IndexStore>>, IndexError> {
        if let Some(store) = self.stores.read().get(wiki) {
            return Ok(Some(Arc::clone(store)));
        }

        let mut stores = self.stores.write();
        if let Some(store) = stores.get(wiki) {
            return Ok(Some(Arc::clone(store)));
        }
        let Some(store) = IndexStore::open(wiki, self.locator.locate(wiki), self.options)? else {
            return Ok(None);
        };
        let store = Arc::new(store);
        stores.insert(wiki.to_string(), Arc::clone(&store));
        Ok(Some(store))
    }

    /// Returns the store of `wiki`, creating an empty index if none exists.
    pub fn get_or_create(&self, wiki: &str) -> Result<Arc<IndexStore>, IndexError> {
        if let Some(store) = self.stores.read().get(wiki) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write();
        if let Some(store) = stores.get(wiki) {
            return Ok(Arc::clone(store));
        }
        let store = Arc::new(IndexStore::open_or_create(
            wiki,
            self.locator.locate(wiki),
            self.options,
        )?);
        stores.insert(wiki.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Deletes the index of `wiki`. Returns false if there was none.
    pub fn remove(&self, wiki: &str) -> Result<bool, IndexError> {
        let mut stores = self.stores.write();
        let Some(store) = stores.remove(wiki) else {
            return IndexStore::destroy_unopened(wiki, &self.locator.locate(wiki));
        };
        store.destroy()?;
        Ok(true)
    }

    /// Wiki ids with an open store, sorted.
    pub fn open_wikis(&self) -> Vec<String> {
        let mut wikis: Vec<String> = self.stores.read().keys().cloned().collect();
        wikis.sort();
        wikis
    }

    /// Options applied to every store.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        analyzer::AnalyzerKind,
        location::{DirectoryLocator, InMemoryLocator},
    };

    #[test]
    fn reads_do_not_create() {
        let registry = IndexRegistry::new(InMemoryLocator, StoreOptions::default());
        assert!(registry.get("root").unwrap().is_none());
        assert!(registry.open_wikis().is_empty());
    }

    #[test]
    fn stores_are_shared() {
        let registry = IndexRegistry::new(InMemoryLocator, StoreOptions::default());
        let created = registry.get_or_create("root").unwrap();
        let found = registry.get("root").unwrap().unwrap();
        assert!(Arc::ptr_eq(&created, &found));
        assert!(Arc::ptr_eq(&created, &registry.get_or_create("root").unwrap()));
        assert_eq!(registry.open_wikis(), vec!["root"]);
    }

    #[test]
    fn wikis_are_isolated_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IndexRegistry::new(DirectoryLocator::new(dir.path()), StoreOptions::default());
        registry.get_or_create("a").unwrap();
        registry.get_or_create("b").unwrap();
        assert!(dir.path().join("a").is_dir());
        assert!(dir.path().join("b").is_dir());

        let reopened =
            IndexRegistry::new(DirectoryLocator::new(dir.path()), StoreOptions::default());
        assert!(reopened.get("a").unwrap().is_some());
        assert!(reopened.get("c").unwrap().is_none());
    }

    #[test]
    fn remove_deletes_index() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IndexRegistry::new(DirectoryLocator::new(dir.path()), StoreOptions::default());
        registry.get_or_create("a").unwrap();
        assert!(registry.remove("a").unwrap());
        assert!(!dir.path().join("a").exists());
        assert!(registry.get("a").unwrap().is_none());
        assert!(!registry.remove("a").unwrap());
    }

    #[test]
    fn remove_unopened_index_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        IndexRegistry::new(DirectoryLocator::new(dir.path()), StoreOptions::default())
            .get_or_create("a")
            .unwrap();

        let registry = IndexRegistry::new(DirectoryLocator::new(dir.path()), StoreOptions::default());
        assert!(registry.remove("a").unwrap());
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn remove_index_built_with_other_analyzer() {
        let dir = tempfile::tempdir().unwrap();
        IndexRegistry::new(DirectoryLocator::new(dir.path()), StoreOptions::default())
            .get_or_create("a")
            .unwrap();

        let options = StoreOptions {
            analyzer: AnalyzerKind::from_name("english").unwrap(),
            ..StoreOptions::default()
        };
        let registry = IndexRegistry::new(DirectoryLocator::new(dir.path()), options);
        assert!(matches!(
            registry.get("a").err().unwrap(),
            IndexError::SchemaMismatch(_)
        ));
        assert!(registry.remove("a").unwrap());
        assert!(!dir.path().join("a").exists());
        assert!(!registry.remove("a").unwrap());
    }
}
