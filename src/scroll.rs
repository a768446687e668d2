//! Visible-position memory.
//!
//! When the page is hidden, the id of the first row that sits fully inside
//! the viewport is saved. On the next load that checkbox is scrolled back
//! into view, but only after two animation frames: reconciliation and the
//! visibility controller mutate the table, and a single frame can still run
//! before the browser has laid those changes out.

use std::future::Future;

use log::{debug, warn};

use crate::page::{Page, PageElement};
use crate::registry::ItemRegistry;
use crate::store::ScalarStore;

pub const VISIBLE_POSITION_KEY: &str = "visible-position";

/// Source of rendering-frame boundaries (`requestAnimationFrame` in the browser).
pub trait FrameScheduler {
    /// Resolves at the next frame boundary.
    fn next_frame(&self) -> impl Future<Output = ()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No position was saved for this document.
    NothingSaved,
    /// The saved item was scrolled into view.
    Scrolled(String),
    /// The saved id no longer exists on the page.
    StaleReference(String),
}

pub struct ScrollMemory<S> {
    scalars: S,
}

impl<S: ScalarStore> ScrollMemory<S> {
    #[must_use]
    pub fn new(scalars: S) -> Self {
        Self { scalars }
    }

    /// The currently saved item id, if any.
    #[must_use]
    pub fn saved_position(&self) -> Option<String> {
        match self.scalars.get(VISIBLE_POSITION_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!("could not read {VISIBLE_POSITION_KEY}: {e}");
                None
            }
        }
    }

    /// Save the first fully visible item. Returns the saved id.
    ///
    /// When no row is fully inside the viewport the previous value is kept.
    pub fn save_visible_position<P: Page>(
        &self,
        page: &P,
        registry: &ItemRegistry<P::Control, P::Element>,
    ) -> Option<String> {
        let viewport_height = page.viewport_height();
        let Some(item) = registry.items().iter().find(|item| item.row.bounds().fits_within(viewport_height)) else {
            debug!("no fully visible item; keeping previous position");
            return None;
        };

        if let Err(e) = self.scalars.set(VISIBLE_POSITION_KEY, &item.id) {
            warn!("could not save {VISIBLE_POSITION_KEY}: {e}");
            return None;
        }
        debug!("saved visible position '{}'", item.id);
        Some(item.id.clone())
    }

    /// Scroll the saved item back into view after two frame boundaries.
    pub async fn restore_visible_position<P: Page, F: FrameScheduler>(&self, page: &P, frames: &F) -> RestoreOutcome {
        let Some(id) = self.saved_position() else {
            return RestoreOutcome::NothingSaved;
        };

        frames.next_frame().await;
        frames.next_frame().await;

        match page.element_by_id(&id) {
            Some(element) => {
                debug!("restoring visible position '{id}'");
                element.scroll_into_view();
                RestoreOutcome::Scrolled(id)
            }
            None => {
                debug!("saved position '{id}' is no longer on the page");
                RestoreOutcome::StaleReference(id)
            }
        }
    }
}

#[cfg(test)]
#[path = "scroll_test.rs"]
mod tests;
