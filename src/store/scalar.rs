//! Namespace prefixing for scalar stores.

use crate::error::StoreError;
use crate::namespace::NamespaceKey;

use super::ScalarStore;

/// A [`ScalarStore`] whose keys are scoped to one document.
///
/// `localStorage` is shared by every page on an origin, so every key goes
/// through [`NamespaceKey::scalar_key`] before reaching the inner store.
#[derive(Clone, Debug)]
pub struct ScopedScalars<S> {
    inner: S,
    namespace: NamespaceKey,
}

impl<S: ScalarStore> ScopedScalars<S> {
    #[must_use]
    pub fn new(inner: S, namespace: NamespaceKey) -> Self {
        Self { inner, namespace }
    }

    #[must_use]
    pub fn namespace(&self) -> &NamespaceKey {
        &self.namespace
    }
}

impl<S: ScalarStore> ScalarStore for ScopedScalars<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(&self.namespace.scalar_key(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(&self.namespace.scalar_key(key), value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(&self.namespace.scalar_key(key))
    }
}
