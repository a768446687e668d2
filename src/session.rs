//! Per-page session context.
//!
//! SYSTEM CONTEXT
//! ==============
//! A [`Session`] is built once the document is ready and lives until the
//! page is torn down. It owns the item store handle, the registry snapshot,
//! the visibility mode and the scroll memory, and exposes the actions the
//! page menu triggers (clear all, dim unchecked, reveal answers).
//!
//! ERROR HANDLING
//! ==============
//! If the item store cannot be opened the session still starts: every
//! checkbox is reset to unchecked and nothing is persisted. All other
//! actions keep working.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::join_all;
use futures::task::{LocalSpawn, LocalSpawnExt};
use log::{error, info, warn};

use crate::namespace::NamespaceKey;
use crate::page::{ChangeSink, ItemControl, Page};
use crate::reconcile::{ReconcileReport, apply_defaults, attach_write_through, reconcile, write_through};
use crate::registry::ItemRegistry;
use crate::scroll::{FrameScheduler, RestoreOutcome, ScrollMemory};
use crate::store::{ItemStore, ScalarStore, ScopedScalars, StoreBackend, StoredItemState};
use crate::visibility::{VisibilityController, toggle_answers};

pub struct Session<S, P: Page, K> {
    namespace: NamespaceKey,
    page: P,
    store: Option<Rc<S>>,
    registry: ItemRegistry<P::Control, P::Element>,
    visibility: RefCell<VisibilityController>,
    scroll: ScrollMemory<ScopedScalars<K>>,
    report: ReconcileReport,
    sink: RefCell<Option<ChangeSink>>,
}

impl<S, P, K> Session<S, P, K>
where
    S: ItemStore + 'static,
    P: Page,
    K: ScalarStore,
{
    /// Open the store, reconcile it with the page and start write-through.
    ///
    /// The write-through task is spawned on `spawner` and runs until
    /// [`Session::close`].
    pub async fn start<B, Sp>(backend: &B, page: P, scalars: K, namespace: NamespaceKey, spawner: &Sp) -> Self
    where
        B: StoreBackend<Store = S>,
        Sp: LocalSpawn + ?Sized,
    {
        let registry = ItemRegistry::enumerate(&page);

        let store = match backend.open(&namespace).await {
            Ok(store) => Some(Rc::new(store)),
            Err(e) => {
                error!("{namespace}: item store unavailable, checkboxes will not persist: {e}");
                None
            }
        };

        let (sink, report) = match &store {
            Some(store) => {
                let (sink, changes) = attach_write_through(&registry);
                if let Err(e) = spawner.spawn_local(write_through(Rc::clone(store), changes)) {
                    warn!("{namespace}: write-through not started: {e}");
                }
                let touched = sink.touched();
                (Some(sink), reconcile(store.as_ref(), &registry, &touched).await)
            }
            None => {
                apply_defaults(&registry);
                (None, ReconcileReport::default())
            }
        };

        info!("{namespace}: session started with {} items", registry.len());

        Self {
            scroll: ScrollMemory::new(ScopedScalars::new(scalars, namespace.clone())),
            namespace,
            page,
            store,
            registry,
            visibility: RefCell::new(VisibilityController::new()),
            report,
            sink: RefCell::new(sink),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &NamespaceKey {
        &self.namespace
    }

    #[must_use]
    pub fn page(&self) -> &P {
        &self.page
    }

    #[must_use]
    pub fn registry(&self) -> &ItemRegistry<P::Control, P::Element> {
        &self.registry
    }

    #[must_use]
    pub fn report(&self) -> ReconcileReport {
        self.report
    }

    /// Whether checkbox changes are being persisted.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    #[must_use]
    pub fn show_unchecked(&self) -> bool {
        self.visibility.borrow().show_unchecked()
    }

    /// Uncheck every item on screen and in the store.
    ///
    /// Returns the number of records that failed to write.
    pub async fn clear_all(&self) -> usize {
        for item in self.registry.items() {
            item.control.set_checked(false);
        }
        self.visibility.borrow().apply(&self.page, &self.registry);

        let Some(store) = &self.store else {
            return 0;
        };
        let cleared: Vec<StoredItemState> = self
            .registry
            .items()
            .iter()
            .map(|item| StoredItemState::new(item.id.clone(), false))
            .collect();
        let results = join_all(cleared.iter().map(|state| store.put(state))).await;

        let mut failed = 0;
        for (state, result) in cleared.iter().zip(results) {
            if let Err(e) = result {
                warn!("item '{}': clear failed: {e}", state.id);
                failed += 1;
            }
        }
        info!("{}: cleared {} items ({failed} failed)", self.namespace, cleared.len());
        failed
    }

    /// Flip dim-unchecked mode. Returns the new `show_unchecked`.
    pub fn toggle_dim_unchecked(&self) -> bool {
        self.visibility.borrow_mut().toggle(&self.page, &self.registry)
    }

    pub fn toggle_answers(&self) {
        toggle_answers(&self.page);
    }

    /// Remember the first fully visible item (call when the page is hidden).
    pub fn save_visible_position(&self) -> Option<String> {
        self.scroll.save_visible_position(&self.page, &self.registry)
    }

    /// Scroll back to the remembered item after two frame boundaries.
    pub async fn restore_visible_position<F: FrameScheduler>(&self, frames: &F) -> RestoreOutcome {
        self.scroll.restore_visible_position(&self.page, frames).await
    }
}

impl<S, P: Page, K> Session<S, P, K> {
    /// Stop write-through. Later checkbox changes are not persisted.
    pub fn close(&self) {
        if let Some(sink) = self.sink.borrow_mut().take() {
            sink.close();
            info!("{}: session closed", self.namespace);
        }
    }
}

impl<S, P: Page, K> Drop for Session<S, P, K> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
