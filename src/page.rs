//! The rendered document as seen by the session.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session never touches `web-sys` directly. It asks a [`Page`] for the
//! checkboxes, their row containers, companion fragments, comment rows and
//! the layout anchor column, and drives them through these traits. The
//! browser implementation lives in `crate::web`; tests use in-memory fakes.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use futures::channel::mpsc::UnboundedSender;

/// A user-driven change to one checkbox.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemChange {
    pub id: String,
    pub checked: bool,
}

/// Ids the user has changed since the sink was created.
#[derive(Clone, Debug, Default)]
pub struct TouchedIds {
    ids: Rc<RefCell<HashSet<String>>>,
}

impl TouchedIds {
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.borrow().contains(id)
    }

    fn mark(&self, id: &str) {
        self.ids.borrow_mut().insert(id.to_owned());
    }
}

/// Where controls push their changes. Closed on session teardown.
///
/// Every change marks its id in [`TouchedIds`] synchronously, before the
/// write-through task sees it, so a lookup still in flight can tell that
/// the page has moved on.
#[derive(Clone, Debug)]
pub struct ChangeSink {
    tx: UnboundedSender<ItemChange>,
    touched: TouchedIds,
}

impl ChangeSink {
    #[must_use]
    pub fn new(tx: UnboundedSender<ItemChange>) -> Self {
        Self { tx, touched: TouchedIds::default() }
    }

    /// Record and forward a change. Returns `false` once the sink is closed.
    pub fn send(&self, change: ItemChange) -> bool {
        self.touched.mark(&change.id);
        self.tx.unbounded_send(change).is_ok()
    }

    #[must_use]
    pub fn touched(&self) -> TouchedIds {
        self.touched.clone()
    }

    pub fn close(&self) {
        self.tx.close_channel();
    }
}

/// Vertical extent of an element relative to the top of the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    /// Whether the box lies entirely inside `[0, viewport_height]`.
    #[must_use]
    pub fn fits_within(&self, viewport_height: f64) -> bool {
        self.top >= 0.0 && self.bottom <= viewport_height
    }
}

/// A checkbox-like control.
pub trait ItemControl {
    /// Stable identifier, used as the storage key.
    fn id(&self) -> String;
    fn is_checked(&self) -> bool;
    /// Set the on-screen state without emitting a change notification.
    fn set_checked(&self, checked: bool);
    /// Forward every user-driven change to `sink`.
    fn subscribe(&self, sink: ChangeSink);
}

/// Any element the session shows, hides, measures or scrolls to.
pub trait PageElement {
    fn set_visible(&self, visible: bool);
    fn is_visible(&self) -> bool;
    fn bounds(&self) -> Bounds;
    fn width(&self) -> f64;
    /// Pin the element to a fixed width.
    fn set_width(&self, width: f64);
    fn scroll_into_view(&self);
}

/// A checkbox paired with the row it is laid out in.
#[derive(Clone, Debug)]
pub struct PageItem<C, E> {
    pub control: C,
    pub row: E,
}

/// The document contract the session consumes.
pub trait Page {
    type Control: ItemControl;
    type Element: PageElement + Clone;

    /// Every tracked checkbox with its row, in document order.
    fn items(&self) -> Vec<PageItem<Self::Control, Self::Element>>;

    /// Fragments grouped under an item id (other rows carrying the id as a class).
    fn companions(&self, id: &str) -> Vec<Self::Element>;

    /// Page-wide comment rows.
    fn comments(&self) -> Vec<Self::Element>;

    /// Answer cells flipped by the reveal toggle.
    fn answers(&self) -> Vec<Self::Element>;

    /// Column whose width must not change while rows are hidden.
    fn layout_anchor(&self) -> Option<Self::Element>;

    fn viewport_height(&self) -> f64;

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
}
