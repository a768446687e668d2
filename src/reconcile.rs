//! Store/DOM reconciliation.
//!
//! DESIGN
//! ======
//! Runs once per load against the registry snapshot:
//!
//! 1. Every checkbox is reset to unchecked, so a slow or failed lookup leaves
//!    the box unchecked rather than showing whatever the browser restored.
//! 2. Each id is looked up concurrently. A stored record overwrites the
//!    default; a missing one is written back as `checked = false`.
//! 3. In parallel, every stored record whose id is not on the page is
//!    deleted. Pages are regenerated between visits, so rows disappear.
//!
//! After load the page is the source of truth: changes flow page → store
//! through [`attach_write_through`], never back. Controls are subscribed
//! before the lookups start, so a user change can land while its lookup is
//! still in flight. The lookup then read a value the user has already
//! replaced: it neither touches the checkbox nor writes a default, and the
//! write-through of the change stands.
//!
//! ERROR HANDLING
//! ==============
//! Each lookup, put and delete fails on its own. A failure is logged,
//! counted in [`ReconcileReport::failed`], and never stops the other items.

use std::collections::HashSet;
use std::rc::Rc;

use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::future::join_all;
use log::{debug, info, warn};

use crate::page::{ChangeSink, ItemChange, ItemControl, TouchedIds};
use crate::registry::{ItemRegistry, LiveItem};
use crate::store::{ItemStore, StoredItemState};

/// What one reconciliation pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Items whose stored state was applied.
    pub restored: usize,
    /// Items with no record, written back as unchecked.
    pub defaulted: usize,
    /// Orphaned records deleted.
    pub pruned: usize,
    /// Lookups, writes or deletes that failed.
    pub failed: usize,
    /// Items the user changed before their lookup finished; left as the user set them.
    pub superseded: usize,
}

enum ItemOutcome {
    Restored,
    Defaulted,
    Failed,
    Superseded,
}

/// Reset every item to unchecked. Also the whole story when no store opened.
pub fn apply_defaults<C: ItemControl, E>(registry: &ItemRegistry<C, E>) {
    for item in registry.items() {
        item.control.set_checked(false);
    }
}

/// Align stored records with the live items and prune orphans.
///
/// Items in `touched` when their lookup completes are left alone.
pub async fn reconcile<S, C, E>(store: &S, registry: &ItemRegistry<C, E>, touched: &TouchedIds) -> ReconcileReport
where
    S: ItemStore,
    C: ItemControl,
{
    apply_defaults(registry);

    let live_ids = registry.ids();
    let lookups = join_all(registry.items().iter().map(|item| restore_item(store, item, touched)));
    let (outcomes, pruned) = futures::join!(lookups, prune_orphans(store, &live_ids));

    let mut report = ReconcileReport::default();
    for outcome in outcomes {
        match outcome {
            ItemOutcome::Restored => report.restored += 1,
            ItemOutcome::Defaulted => report.defaulted += 1,
            ItemOutcome::Failed => report.failed += 1,
            ItemOutcome::Superseded => report.superseded += 1,
        }
    }
    report.pruned = pruned.deleted;
    report.failed += pruned.failed;

    info!(
        "reconciled {} items: restored={} defaulted={} pruned={} failed={} superseded={}",
        registry.len(),
        report.restored,
        report.defaulted,
        report.pruned,
        report.failed,
        report.superseded
    );
    report
}

async fn restore_item<S: ItemStore, C: ItemControl, E>(
    store: &S,
    item: &LiveItem<C, E>,
    touched: &TouchedIds,
) -> ItemOutcome {
    let found = store.get(&item.id).await;
    if touched.contains(&item.id) {
        debug!("item '{}' changed during load; keeping the on-screen state", item.id);
        return ItemOutcome::Superseded;
    }
    match found {
        Ok(Some(stored)) => {
            item.control.set_checked(stored.checked);
            ItemOutcome::Restored
        }
        Ok(None) => match store.put(&StoredItemState::new(item.id.clone(), false)).await {
            Ok(()) => ItemOutcome::Defaulted,
            Err(e) => {
                warn!("item '{}': default write failed: {e}", item.id);
                ItemOutcome::Failed
            }
        },
        Err(e) => {
            warn!("item '{}': lookup failed, left unchecked: {e}", item.id);
            ItemOutcome::Failed
        }
    }
}

#[derive(Default)]
struct PruneResult {
    deleted: usize,
    failed: usize,
}

async fn prune_orphans<S: ItemStore>(store: &S, live_ids: &HashSet<&str>) -> PruneResult {
    let records = match store.get_all().await {
        Ok(records) => records,
        Err(e) => {
            warn!("orphan cleanup skipped: {e}");
            return PruneResult { deleted: 0, failed: 1 };
        }
    };

    let orphans: Vec<String> = records
        .into_iter()
        .filter(|record| !live_ids.contains(record.id.as_str()))
        .map(|record| record.id)
        .collect();

    let results = join_all(orphans.iter().map(|id| store.delete(id))).await;
    let mut outcome = PruneResult::default();
    for (id, result) in orphans.iter().zip(results) {
        match result {
            Ok(()) => {
                debug!("pruned orphaned record '{id}'");
                outcome.deleted += 1;
            }
            Err(e) => {
                warn!("failed to prune orphaned record '{id}': {e}");
                outcome.failed += 1;
            }
        }
    }
    outcome
}

/// Subscribe every item to a shared change channel.
///
/// Returns the sink (kept by the session so teardown can close it) and the
/// receiver to hand to [`write_through`].
pub fn attach_write_through<C: ItemControl, E>(
    registry: &ItemRegistry<C, E>,
) -> (ChangeSink, UnboundedReceiver<ItemChange>) {
    let (tx, rx) = mpsc::unbounded();
    let tx = ChangeSink::new(tx);
    for item in registry.items() {
        item.control.subscribe(tx.clone());
    }
    (tx, rx)
}

/// Persist each change as it arrives, until the channel closes.
///
/// Changes are applied in arrival order, so the stored value for an id
/// always ends up equal to its latest on-screen state.
pub async fn write_through<S: ItemStore>(store: Rc<S>, mut changes: UnboundedReceiver<ItemChange>) {
    while let Some(change) = changes.next().await {
        debug!("item '{}' changed: checked={}", change.id, change.checked);
        if let Err(e) = store.put(&StoredItemState::new(change.id.clone(), change.checked)).await {
            warn!("item '{}': write-through failed: {e}", change.id);
        }
    }
    debug!("write-through stopped");
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
