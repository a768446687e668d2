//! # quizmark
//!
//! Checkbox state persistence for generated quiz pages.
//!
//! Each page renders a table of question rows with a checkbox per row. This
//! crate remembers which boxes were ticked (per page, in IndexedDB), keeps the
//! stored records in step with the rows that actually exist on the page,
//! dims unchecked rows on request, and brings the reader back to the row they
//! were looking at when they left.
//!
//! The logic is written against small traits ([`page::Page`],
//! [`store::ItemStore`], [`store::ScalarStore`], [`scroll::FrameScheduler`])
//! so it can be tested natively. The `hydrate` feature compiles the [`web`]
//! bindings that implement those traits on top of `web-sys`.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Per-page session context: load, actions, teardown |
//! | [`reconcile`] | Store/DOM reconciliation and write-through |
//! | [`visibility`] | Dim-unchecked mode and answer reveal |
//! | [`scroll`] | Visible-position save and deferred restore |
//! | [`registry`] | Live item enumeration and companion index |
//! | [`page`] | Traits describing the rendered document |
//! | [`store`] | Item and scalar store traits plus the in-memory backend |
//! | [`namespace`] | Per-document storage partitioning |
//! | [`config`] | Page selectors and storage settings |
//! | [`error`] | Store and config error types |

pub mod config;
pub mod error;
pub mod namespace;
pub mod page;
pub mod reconcile;
pub mod registry;
pub mod scroll;
pub mod session;
pub mod store;
pub mod visibility;
#[cfg(feature = "hydrate")]
pub mod web;

#[cfg(test)]
mod test_support;
