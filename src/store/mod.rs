//! Persistence traits for item state and page scalars.
//!
//! DESIGN
//! ======
//! Item records are keyed by checkbox id and written one row at a time.
//! Nothing relies on cross-row transactions: each id is only ever written
//! by its own checkbox, so concurrent puts for different ids may interleave
//! in any order. Scalars (the remembered scroll position) are small strings
//! kept in a synchronous store.

pub mod memory;
pub mod scalar;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::namespace::NamespaceKey;

pub use memory::{MemoryBackend, MemoryItemStore, MemoryScalars};
pub use scalar::ScopedScalars;

/// Persisted checked state for one item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItemState {
    pub id: String,
    /// Older pages wrote this field as `state`.
    #[serde(alias = "state")]
    pub checked: bool,
}

impl StoredItemState {
    #[must_use]
    pub fn new(id: impl Into<String>, checked: bool) -> Self {
        Self { id: id.into(), checked }
    }
}

/// Opens item stores for a namespace.
pub trait StoreBackend {
    type Store: ItemStore;

    /// Open (creating if needed) the store for `namespace`.
    fn open(&self, namespace: &NamespaceKey) -> impl Future<Output = Result<Self::Store, StoreError>>;
}

/// An open, namespaced item store.
pub trait ItemStore {
    /// Look up one record. `Ok(None)` means no record exists.
    fn get(&self, id: &str) -> impl Future<Output = Result<Option<StoredItemState>, StoreError>>;

    /// Every record in the store, in no particular order.
    fn get_all(&self) -> impl Future<Output = Result<Vec<StoredItemState>, StoreError>>;

    /// Insert or replace the record for `state.id`.
    fn put(&self, state: &StoredItemState) -> impl Future<Output = Result<(), StoreError>>;

    /// Remove the record for `id`. Removing a missing id succeeds.
    fn delete(&self, id: &str) -> impl Future<Output = Result<(), StoreError>>;
}

/// Synchronous string store for page-level scalars.
pub trait ScalarStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
