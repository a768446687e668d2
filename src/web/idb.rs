//! IndexedDB item store.
//!
//! DESIGN
//! ======
//! One database per document (named after it), one object store keyed by
//! `id`. Records are the JSON form of [`StoredItemState`], so the same
//! serde shape is used on every backend. Requests are turned into futures
//! with a oneshot channel completed from the `success`/`error` callbacks;
//! the callbacks stay owned by the awaiting future and are dropped with it.
//! An open that is `blocked` by another tab fails at once with
//! [`StoreError::Unavailable`] instead of waiting for that tab to close.
//!
//! A version bump recreates the object store, abandoning the old rows.

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use log::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Event, IdbDatabase, IdbObjectStore, IdbObjectStoreParameters, IdbOpenDbRequest, IdbRequest, IdbTransactionMode,
    Window,
};

use crate::error::StoreError;
use crate::namespace::NamespaceKey;
use crate::store::{ItemStore, StoreBackend, StoredItemState};

use super::js_error;

const KEY_PATH: &str = "id";

type Completion = Rc<RefCell<Option<oneshot::Sender<Result<JsValue, StoreError>>>>>;

fn complete(slot: &Completion, outcome: Result<JsValue, StoreError>) {
    if let Some(tx) = slot.borrow_mut().take() {
        if tx.send(outcome).is_err() {
            debug!("IndexedDB request finished after its waiter was dropped");
        }
    }
}

fn request_error(request: &IdbRequest) -> String {
    match request.error() {
        Ok(Some(e)) => e.message(),
        Ok(None) => "unknown error".to_owned(),
        Err(e) => js_error(&e),
    }
}

/// Callbacks wired to one `IDBRequest`, completing a oneshot.
///
/// Extra callbacks (such as `blocked` on an open) can finish the same
/// request early through [`PendingRequest::slot`].
struct PendingRequest {
    request: IdbRequest,
    slot: Completion,
    rx: oneshot::Receiver<Result<JsValue, StoreError>>,
    on_success: Closure<dyn FnMut(Event)>,
    on_error: Closure<dyn FnMut(Event)>,
}

impl PendingRequest {
    fn new(request: &IdbRequest) -> Self {
        let (tx, rx) = oneshot::channel();
        let slot: Completion = Rc::new(RefCell::new(Some(tx)));

        let on_success = {
            let slot = Rc::clone(&slot);
            let request = request.clone();
            Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                complete(&slot, request.result().map_err(|e| StoreError::Request(js_error(&e))));
            })
        };
        let on_error = {
            let slot = Rc::clone(&slot);
            let request = request.clone();
            Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                complete(&slot, Err(StoreError::Request(request_error(&request))));
            })
        };
        request.set_onsuccess(Some(on_success.as_ref().unchecked_ref()));
        request.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Self { request: request.clone(), slot, rx, on_success, on_error }
    }

    fn slot(&self) -> Completion {
        Rc::clone(&self.slot)
    }

    /// Wait for the first completion, then detach the callbacks.
    async fn finish(self) -> Result<JsValue, StoreError> {
        let Self { request, slot: _, rx, on_success, on_error } = self;
        let outcome = rx.await;
        request.set_onsuccess(None);
        request.set_onerror(None);
        drop((on_success, on_error));

        outcome.map_err(|_| StoreError::Request("request abandoned".to_owned()))?
    }
}

/// Await an `IDBRequest`, yielding its `result` or the request error.
async fn await_request(request: &IdbRequest) -> Result<JsValue, StoreError> {
    PendingRequest::new(request).finish().await
}

/// A blocked open may still complete once the other connection goes away.
/// Close it then so this page never holds a connection it gave up on.
fn close_when_opened(request: &IdbOpenDbRequest) {
    let late = request.clone();
    let on_late_success = Closure::once_into_js(move |_event: Event| {
        if let Ok(db) = late.result().and_then(|value| value.dyn_into::<IdbDatabase>()) {
            debug!("closing IndexedDB connection that opened after being blocked");
            db.close();
        }
    });
    request.set_onsuccess(Some(on_late_success.unchecked_ref()));
}

/// Opens one IndexedDB database per document.
#[derive(Clone, Debug)]
pub struct IndexedDbBackend {
    window: Window,
    object_store: String,
}

impl IndexedDbBackend {
    #[must_use]
    pub fn new(window: Window, object_store: String) -> Self {
        Self { window, object_store }
    }
}

impl StoreBackend for IndexedDbBackend {
    type Store = IndexedDbStore;

    async fn open(&self, namespace: &NamespaceKey) -> Result<IndexedDbStore, StoreError> {
        let factory = match self.window.indexed_db() {
            Ok(Some(factory)) => factory,
            Ok(None) => return Err(StoreError::Unavailable("indexedDB not supported".to_owned())),
            Err(e) => return Err(StoreError::Unavailable(js_error(&e))),
        };
        let request: IdbOpenDbRequest = factory
            .open_with_u32(namespace.document(), namespace.version())
            .map_err(|e| StoreError::Unavailable(js_error(&e)))?;

        // Upgrade fires at most once and may come after a blocked open was abandoned.
        let on_upgrade = {
            let request = request.clone();
            let store_name = self.object_store.clone();
            let label = namespace.to_string();
            Closure::once_into_js(move |_event: Event| {
                if let Err(e) = create_object_store(&request, &store_name) {
                    warn!("{label}: schema upgrade failed: {e}");
                } else {
                    info!("{label}: created object store '{store_name}'");
                }
            })
        };
        request.set_onupgradeneeded(Some(on_upgrade.unchecked_ref()));

        let pending = PendingRequest::new(&request);
        let on_blocked = {
            let slot = pending.slot();
            let label = namespace.to_string();
            Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                warn!("{label}: IndexedDB open blocked by another tab holding an older version");
                complete(&slot, Err(StoreError::Unavailable("open blocked by an older connection".to_owned())));
            })
        };
        request.set_onblocked(Some(on_blocked.as_ref().unchecked_ref()));

        let opened = pending.finish().await;
        request.set_onblocked(None);
        drop(on_blocked);
        if matches!(opened, Err(StoreError::Unavailable(_))) {
            close_when_opened(&request);
        }

        let db = opened
            .map_err(|e| match e {
                StoreError::Request(reason) => StoreError::Unavailable(reason),
                other => other,
            })?
            .dyn_into::<IdbDatabase>()
            .map_err(|value| StoreError::Unavailable(format!("open returned {value:?}")))?;

        if !db.object_store_names().contains(&self.object_store) {
            return Err(StoreError::Unavailable(format!("object store '{}' missing", self.object_store)));
        }
        debug!("{namespace}: IndexedDB open");
        Ok(IndexedDbStore { db, object_store: self.object_store.clone() })
    }
}

/// Runs inside `upgradeneeded`: drop any previous store, create a fresh one.
fn create_object_store(request: &IdbOpenDbRequest, store_name: &str) -> Result<(), StoreError> {
    let db = request
        .result()
        .map_err(|e| StoreError::Unavailable(js_error(&e)))?
        .dyn_into::<IdbDatabase>()
        .map_err(|value| StoreError::Unavailable(format!("upgrade returned {value:?}")))?;

    if db.object_store_names().contains(store_name) {
        db.delete_object_store(store_name)
            .map_err(|e| StoreError::Unavailable(js_error(&e)))?;
    }
    let params = IdbObjectStoreParameters::new();
    params.set_key_path(&JsValue::from_str(KEY_PATH));
    db.create_object_store_with_optional_parameters(store_name, &params)
        .map_err(|e| StoreError::Unavailable(js_error(&e)))?;
    Ok(())
}

/// An open per-document database.
#[derive(Clone, Debug)]
pub struct IndexedDbStore {
    db: IdbDatabase,
    object_store: String,
}

impl IndexedDbStore {
    fn object_store(&self, mode: IdbTransactionMode) -> Result<IdbObjectStore, StoreError> {
        self.db
            .transaction_with_str_and_mode(&self.object_store, mode)
            .and_then(|tx| tx.object_store(&self.object_store))
            .map_err(|e| StoreError::Request(js_error(&e)))
    }
}

fn encode(state: &StoredItemState) -> Result<JsValue, StoreError> {
    let text = serde_json::to_string(state).map_err(|e| StoreError::Malformed(e.to_string()))?;
    js_sys::JSON::parse(&text).map_err(|e| StoreError::Malformed(js_error(&e)))
}

fn decode(value: &JsValue) -> Result<StoredItemState, StoreError> {
    let text: String = js_sys::JSON::stringify(value)
        .map_err(|e| StoreError::Malformed(js_error(&e)))?
        .into();
    serde_json::from_str(&text).map_err(|e| StoreError::Malformed(format!("{e}: {text}")))
}

fn request_failed(e: &JsValue) -> StoreError {
    StoreError::Request(js_error(e))
}

impl ItemStore for IndexedDbStore {
    async fn get(&self, id: &str) -> Result<Option<StoredItemState>, StoreError> {
        let request = self
            .object_store(IdbTransactionMode::Readonly)?
            .get(&JsValue::from_str(id))
            .map_err(|e| request_failed(&e))?;
        let value = await_request(&request).await?;
        if value.is_undefined() {
            return Ok(None);
        }
        decode(&value).map(Some)
    }

    async fn get_all(&self) -> Result<Vec<StoredItemState>, StoreError> {
        let request = self
            .object_store(IdbTransactionMode::Readonly)?
            .get_all()
            .map_err(|e| request_failed(&e))?;
        let rows = await_request(&request)
            .await?
            .dyn_into::<js_sys::Array>()
            .map_err(|value| StoreError::Malformed(format!("getAll returned {value:?}")))?;

        let mut records = Vec::new();
        for row in rows.iter() {
            match decode(&row) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping unreadable record: {e}"),
            }
        }
        Ok(records)
    }

    async fn put(&self, state: &StoredItemState) -> Result<(), StoreError> {
        let value = encode(state)?;
        let request = self
            .object_store(IdbTransactionMode::Readwrite)?
            .put(&value)
            .map_err(|e| request_failed(&e))?;
        await_request(&request).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let request = self
            .object_store(IdbTransactionMode::Readwrite)?
            .delete(&JsValue::from_str(id))
            .map_err(|e| request_failed(&e))?;
        await_request(&request).await?;
        Ok(())
    }
}
