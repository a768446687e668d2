//! In-memory store backend.
//!
//! Used on native targets and in tests. It follows the IndexedDB rules the
//! browser backend relies on: one database per document, a version bump
//! discards the old rows, opening with an older version than the stored
//! one fails, and a version bump while another connection still holds the
//! older version fails at once instead of waiting.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use log::info;

use crate::error::StoreError;
use crate::namespace::NamespaceKey;

use super::{ItemStore, ScalarStore, StoreBackend, StoredItemState};

#[derive(Default)]
struct MemoryDatabase {
    version: u32,
    rows: BTreeMap<String, bool>,
}

#[derive(Default)]
struct MemoryInner {
    databases: HashMap<String, MemoryDatabase>,
    /// Versions held open by other tabs, per document.
    held: HashMap<String, u32>,
    disabled: Option<String>,
}

/// Shared in-memory "origin" holding one database per document.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every `open` fails, like storage blocked by the browser.
    #[must_use]
    pub fn disabled(reason: impl Into<String>) -> Self {
        let backend = Self::default();
        backend.inner.borrow_mut().disabled = Some(reason.into());
        backend
    }

    /// Simulate another tab keeping `namespace` open at its version.
    pub fn hold_connection(&self, namespace: &NamespaceKey) {
        let mut inner = self.inner.borrow_mut();
        inner
            .databases
            .entry(namespace.document().to_owned())
            .or_insert_with(|| MemoryDatabase { version: namespace.version(), rows: BTreeMap::new() });
        inner.held.insert(namespace.document().to_owned(), namespace.version());
    }
}

impl StoreBackend for MemoryBackend {
    type Store = MemoryItemStore;

    async fn open(&self, namespace: &NamespaceKey) -> Result<MemoryItemStore, StoreError> {
        let mut inner = self.inner.borrow_mut();
        if let Some(reason) = &inner.disabled {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        if let Some(held) = inner.held.get(namespace.document()) {
            if *held < namespace.version() {
                return Err(StoreError::Unavailable("open blocked by an older connection".to_owned()));
            }
        }

        let db = inner
            .databases
            .entry(namespace.document().to_owned())
            .or_insert_with(|| MemoryDatabase { version: namespace.version(), rows: BTreeMap::new() });

        if db.version > namespace.version() {
            return Err(StoreError::Unavailable(format!(
                "stored version {} is newer than requested {}",
                db.version,
                namespace.version()
            )));
        }
        if db.version < namespace.version() {
            info!("{namespace}: schema bump from v{}, discarding {} rows", db.version, db.rows.len());
            db.version = namespace.version();
            db.rows.clear();
        }

        Ok(MemoryItemStore {
            inner: Rc::clone(&self.inner),
            document: namespace.document().to_owned(),
            version: namespace.version(),
        })
    }
}

/// Handle to one document's rows inside a [`MemoryBackend`].
#[derive(Clone)]
pub struct MemoryItemStore {
    inner: Rc<RefCell<MemoryInner>>,
    document: String,
    version: u32,
}

impl MemoryItemStore {
    fn with_rows<T>(&self, f: impl FnOnce(&mut BTreeMap<String, bool>) -> T) -> Result<T, StoreError> {
        let mut inner = self.inner.borrow_mut();
        match inner.databases.get_mut(&self.document) {
            Some(db) if db.version == self.version => Ok(f(&mut db.rows)),
            _ => Err(StoreError::Request(format!("{}: connection closed by version change", self.document))),
        }
    }
}

impl ItemStore for MemoryItemStore {
    async fn get(&self, id: &str) -> Result<Option<StoredItemState>, StoreError> {
        self.with_rows(|rows| rows.get(id).map(|checked| StoredItemState::new(id, *checked)))
    }

    async fn get_all(&self) -> Result<Vec<StoredItemState>, StoreError> {
        self.with_rows(|rows| {
            rows.iter()
                .map(|(id, checked)| StoredItemState::new(id.clone(), *checked))
                .collect()
        })
    }

    async fn put(&self, state: &StoredItemState) -> Result<(), StoreError> {
        self.with_rows(|rows| {
            rows.insert(state.id.clone(), state.checked);
        })
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.with_rows(|rows| {
            rows.remove(id);
        })
    }
}

/// In-memory stand-in for `localStorage`.
#[derive(Clone, Default)]
pub struct MemoryScalars {
    values: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryScalars {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScalarStore for MemoryScalars {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
