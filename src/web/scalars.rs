//! `localStorage`-backed scalar store.

use log::warn;
use web_sys::{Storage, Window};

use crate::error::StoreError;
use crate::store::ScalarStore;

use super::js_error;

/// Raw `localStorage`. Wrap in [`crate::store::ScopedScalars`] before use.
#[derive(Clone, Debug)]
pub struct LocalScalars {
    storage: Option<Storage>,
}

impl LocalScalars {
    /// `localStorage` can throw or be absent (sandboxed frames, privacy modes).
    #[must_use]
    pub fn from_window(window: &Window) -> Self {
        let storage = match window.local_storage() {
            Ok(Some(storage)) => Some(storage),
            Ok(None) => {
                warn!("localStorage not available; scroll position will not be remembered");
                None
            }
            Err(e) => {
                warn!("localStorage blocked: {}", js_error(&e));
                None
            }
        };
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage, StoreError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("localStorage".to_owned()))
    }
}

impl ScalarStore for LocalScalars {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StoreError::Request(js_error(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::Request(js_error(&e)))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| StoreError::Request(js_error(&e)))
    }
}
