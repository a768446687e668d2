//! Dim-unchecked mode and answer reveal.
//!
//! Hiding rows in a table lets the browser recompute column widths, so the
//! question column would jump every time the mode flips. The controller
//! measures the layout anchor once, before the first toggle, and pins it to
//! that width after every toggle.

use log::debug;

use crate::page::{ItemControl, Page, PageElement};
use crate::registry::ItemRegistry;

#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityController {
    show_unchecked: bool,
    anchor_width: Option<f64>,
}

impl Default for VisibilityController {
    fn default() -> Self {
        Self { show_unchecked: true, anchor_width: None }
    }
}

impl VisibilityController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn show_unchecked(&self) -> bool {
        self.show_unchecked
    }

    /// Anchor width captured before the first toggle, if any.
    #[must_use]
    pub fn anchor_width(&self) -> Option<f64> {
        self.anchor_width
    }

    /// Flip dim-unchecked mode and apply it. Returns the new `show_unchecked`.
    pub fn toggle<P: Page>(&mut self, page: &P, registry: &ItemRegistry<P::Control, P::Element>) -> bool {
        if self.anchor_width.is_none() {
            self.anchor_width = page.layout_anchor().map(|anchor| anchor.width());
        }
        self.show_unchecked = !self.show_unchecked;
        debug!("dim-unchecked: show_unchecked={}", self.show_unchecked);
        self.apply(page, registry);
        self.show_unchecked
    }

    /// Make every element match the current mode without flipping it.
    ///
    /// An item is visible when unchecked items are shown or it is checked;
    /// its companions follow it. Comment rows follow `show_unchecked`.
    pub fn apply<P: Page>(&self, page: &P, registry: &ItemRegistry<P::Control, P::Element>) {
        for item in registry.items() {
            let visible = self.show_unchecked || item.control.is_checked();
            item.row.set_visible(visible);
            for companion in registry.companions(&item.id) {
                companion.set_visible(visible);
            }
        }
        for comment in page.comments() {
            comment.set_visible(self.show_unchecked);
        }
        if let (Some(anchor), Some(width)) = (page.layout_anchor(), self.anchor_width) {
            anchor.set_width(width);
        }
    }
}

/// Flip every answer cell between concealed and shown.
///
/// Each cell flips on its own, so a cell revealed by other means is hidden
/// by the next toggle and vice versa.
pub fn toggle_answers<P: Page>(page: &P) {
    for answer in page.answers() {
        answer.set_visible(!answer.is_visible());
    }
}

#[cfg(test)]
#[path = "visibility_test.rs"]
mod tests;
