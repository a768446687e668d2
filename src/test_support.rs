//! In-memory page, store and frame fakes shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;

use crate::error::StoreError;
use crate::page::{Bounds, ChangeSink, ItemControl, Page, PageElement, PageItem};
use crate::scroll::FrameScheduler;
use crate::store::{ItemStore, StoredItemState};

pub const ROW_HEIGHT: f64 = 20.0;

// =============================================================
// Elements
// =============================================================

#[derive(Debug)]
struct ElementState {
    visible: bool,
    width: f64,
    pinned: Option<f64>,
    bounds: Bounds,
    scrolls: usize,
}

#[derive(Clone, Debug)]
pub struct FakeElement {
    state: Rc<RefCell<ElementState>>,
}

impl FakeElement {
    pub fn new() -> Self {
        Self::at(0.0, ROW_HEIGHT)
    }

    pub fn at(top: f64, bottom: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(ElementState {
                visible: true,
                width: 100.0,
                pinned: None,
                bounds: Bounds { top, bottom },
                scrolls: 0,
            })),
        }
    }

    pub fn with_width(width: f64) -> Self {
        let el = Self::new();
        el.state.borrow_mut().width = width;
        el
    }

    /// Simulate the browser relaying out the element at a new width.
    pub fn reflow(&self, width: f64) {
        self.state.borrow_mut().width = width;
    }

    pub fn move_to(&self, top: f64, bottom: f64) {
        self.state.borrow_mut().bounds = Bounds { top, bottom };
    }

    pub fn pinned_width(&self) -> Option<f64> {
        self.state.borrow().pinned
    }

    pub fn scroll_count(&self) -> usize {
        self.state.borrow().scrolls
    }
}

impl PageElement for FakeElement {
    fn set_visible(&self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    fn bounds(&self) -> Bounds {
        self.state.borrow().bounds
    }

    fn width(&self) -> f64 {
        self.state.borrow().width
    }

    fn set_width(&self, width: f64) {
        let mut state = self.state.borrow_mut();
        state.width = width;
        state.pinned = Some(width);
    }

    fn scroll_into_view(&self) {
        self.state.borrow_mut().scrolls += 1;
    }
}

// =============================================================
// Controls
// =============================================================

#[derive(Clone, Debug)]
pub struct FakeControl {
    id: String,
    checked: Rc<Cell<bool>>,
    sinks: Rc<RefCell<Vec<ChangeSink>>>,
}

impl FakeControl {
    pub fn new(id: &str, checked: bool) -> Self {
        Self { id: id.to_owned(), checked: Rc::new(Cell::new(checked)), sinks: Rc::default() }
    }

    /// Simulate the user ticking or unticking the box.
    pub fn click(&self, checked: bool) {
        self.checked.set(checked);
        for sink in self.sinks.borrow().iter() {
            sink.send(crate::page::ItemChange { id: self.id.clone(), checked });
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sinks.borrow().len()
    }
}

impl ItemControl for FakeControl {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn is_checked(&self) -> bool {
        self.checked.get()
    }

    fn set_checked(&self, checked: bool) {
        self.checked.set(checked);
    }

    fn subscribe(&self, sink: ChangeSink) {
        self.sinks.borrow_mut().push(sink);
    }
}

// =============================================================
// Page
// =============================================================

struct FakeItem {
    control: FakeControl,
    row: FakeElement,
    target: FakeElement,
}

struct PageInner {
    items: Vec<FakeItem>,
    companions: HashMap<String, Vec<FakeElement>>,
    comments: Vec<FakeElement>,
    answers: Vec<FakeElement>,
    anchor: Option<FakeElement>,
    viewport_height: f64,
}

/// A table of rows stacked `ROW_HEIGHT` apart from the top of the viewport.
#[derive(Clone)]
pub struct FakePage {
    inner: Rc<RefCell<PageInner>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(PageInner {
                items: Vec::new(),
                companions: HashMap::new(),
                comments: Vec::new(),
                answers: Vec::new(),
                anchor: None,
                viewport_height: 1000.0,
            })),
        }
    }

    /// Convenience: a page holding one unchecked item per id.
    pub fn with_items(ids: &[&str]) -> Self {
        ids.iter().fold(Self::new(), |page, id| page.item(id, false))
    }

    pub fn item(self, id: &str, checked: bool) -> Self {
        {
            let mut inner = self.inner.borrow_mut();
            #[allow(clippy::cast_precision_loss)]
            let top = inner.items.len() as f64 * ROW_HEIGHT;
            inner.items.push(FakeItem {
                control: FakeControl::new(id, checked),
                row: FakeElement::at(top, top + ROW_HEIGHT),
                target: FakeElement::at(top, top + ROW_HEIGHT),
            });
        }
        self
    }

    pub fn companion(self, id: &str) -> Self {
        self.inner.borrow_mut().companions.entry(id.to_owned()).or_default().push(FakeElement::new());
        self
    }

    pub fn comment(self) -> Self {
        self.inner.borrow_mut().comments.push(FakeElement::new());
        self
    }

    pub fn answer(self) -> Self {
        self.inner.borrow_mut().answers.push(FakeElement::new());
        self
    }

    pub fn anchor(self, width: f64) -> Self {
        self.inner.borrow_mut().anchor = Some(FakeElement::with_width(width));
        self
    }

    pub fn viewport(self, height: f64) -> Self {
        self.inner.borrow_mut().viewport_height = height;
        self
    }

    /// Shift every row by `dy`, as scrolling the document would.
    pub fn scroll_by(&self, dy: f64) {
        for item in &self.inner.borrow().items {
            let b = item.row.bounds();
            item.row.move_to(b.top - dy, b.bottom - dy);
        }
    }

    pub fn control(&self, id: &str) -> FakeControl {
        self.find(id, |item| item.control.clone())
    }

    pub fn row(&self, id: &str) -> FakeElement {
        self.find(id, |item| item.row.clone())
    }

    /// The element `element_by_id` resolves to (the checkbox itself).
    pub fn target(&self, id: &str) -> FakeElement {
        self.find(id, |item| item.target.clone())
    }

    pub fn controls(&self) -> Vec<FakeControl> {
        self.inner.borrow().items.iter().map(|item| item.control.clone()).collect()
    }

    fn find<T>(&self, id: &str, f: impl Fn(&FakeItem) -> T) -> T {
        let inner = self.inner.borrow();
        let item = inner.items.iter().find(|item| item.control.id == id);
        f(item.unwrap_or_else(|| panic!("no fake item '{id}'")))
    }
}

impl Page for FakePage {
    type Control = FakeControl;
    type Element = FakeElement;

    fn items(&self) -> Vec<PageItem<FakeControl, FakeElement>> {
        self.inner
            .borrow()
            .items
            .iter()
            .map(|item| PageItem { control: item.control.clone(), row: item.row.clone() })
            .collect()
    }

    fn companions(&self, id: &str) -> Vec<FakeElement> {
        self.inner.borrow().companions.get(id).cloned().unwrap_or_default()
    }

    fn comments(&self) -> Vec<FakeElement> {
        self.inner.borrow().comments.clone()
    }

    fn answers(&self) -> Vec<FakeElement> {
        self.inner.borrow().answers.clone()
    }

    fn layout_anchor(&self) -> Option<FakeElement> {
        self.inner.borrow().anchor.clone()
    }

    fn viewport_height(&self) -> f64 {
        self.inner.borrow().viewport_height
    }

    fn element_by_id(&self, id: &str) -> Option<FakeElement> {
        let inner = self.inner.borrow();
        inner.items.iter().find(|item| item.control.id == id).map(|item| item.target.clone())
    }
}

// =============================================================
// Stores
// =============================================================

/// Wraps a store and fails selected operations.
pub struct FlakyStore<S> {
    inner: S,
    failing_gets: HashSet<String>,
    failing_puts: HashSet<String>,
    fail_get_all: bool,
    puts: Cell<usize>,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, failing_gets: HashSet::new(), failing_puts: HashSet::new(), fail_get_all: false, puts: Cell::new(0) }
    }

    pub fn fail_get(mut self, id: &str) -> Self {
        self.failing_gets.insert(id.to_owned());
        self
    }

    pub fn fail_put(mut self, id: &str) -> Self {
        self.failing_puts.insert(id.to_owned());
        self
    }

    pub fn fail_get_all(mut self) -> Self {
        self.fail_get_all = true;
        self
    }

    /// Number of put calls that reached the inner store.
    pub fn puts(&self) -> usize {
        self.puts.get()
    }
}

impl<S: ItemStore> ItemStore for FlakyStore<S> {
    async fn get(&self, id: &str) -> Result<Option<StoredItemState>, StoreError> {
        if self.failing_gets.contains(id) {
            return Err(StoreError::Request(format!("get {id} failed")));
        }
        self.inner.get(id).await
    }

    async fn get_all(&self) -> Result<Vec<StoredItemState>, StoreError> {
        if self.fail_get_all {
            return Err(StoreError::Request("get_all failed".to_owned()));
        }
        self.inner.get_all().await
    }

    async fn put(&self, state: &StoredItemState) -> Result<(), StoreError> {
        if self.failing_puts.contains(&state.id) {
            return Err(StoreError::Request(format!("put {} failed", state.id)));
        }
        self.puts.set(self.puts.get() + 1);
        self.inner.put(state).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }
}

/// Releases every waiter at once when opened; later waiters pass straight through.
#[derive(Clone, Default)]
pub struct Gate {
    waiters: Rc<RefCell<Vec<oneshot::Sender<()>>>>,
    open: Rc<Cell<bool>>,
}

impl Gate {
    pub fn open(&self) {
        self.open.set(true);
        for tx in self.waiters.borrow_mut().drain(..) {
            let _ = tx.send(());
        }
    }

    fn wait(&self) -> impl Future<Output = ()> {
        let rx = if self.open.get() {
            None
        } else {
            let (tx, rx) = oneshot::channel();
            self.waiters.borrow_mut().push(tx);
            Some(rx)
        };
        async move {
            if let Some(rx) = rx {
                let _ = rx.await;
            }
        }
    }
}

/// A store whose `get` reads its answer when called but only delivers it
/// once the gate opens, like an IndexedDB request still in flight.
pub struct GatedStore<S> {
    inner: S,
    gate: Gate,
}

impl<S> GatedStore<S> {
    pub fn new(inner: S, gate: Gate) -> Self {
        Self { inner, gate }
    }
}

impl<S: ItemStore> ItemStore for GatedStore<S> {
    async fn get(&self, id: &str) -> Result<Option<StoredItemState>, StoreError> {
        let found = self.inner.get(id).await;
        self.gate.wait().await;
        found
    }

    async fn get_all(&self) -> Result<Vec<StoredItemState>, StoreError> {
        self.inner.get_all().await
    }

    async fn put(&self, state: &StoredItemState) -> Result<(), StoreError> {
        self.inner.put(state).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }
}

// =============================================================
// Frames
// =============================================================

/// Frame scheduler advanced by hand with [`ManualFrames::tick`].
#[derive(Clone, Default)]
pub struct ManualFrames {
    pending: Rc<RefCell<Vec<oneshot::Sender<()>>>>,
    requested: Rc<Cell<usize>>,
}

impl ManualFrames {
    /// Run one frame boundary: wake every request made so far.
    pub fn tick(&self) {
        for tx in self.pending.borrow_mut().drain(..) {
            let _ = tx.send(());
        }
    }

    pub fn requested(&self) -> usize {
        self.requested.get()
    }
}

impl FrameScheduler for ManualFrames {
    fn next_frame(&self) -> impl Future<Output = ()> {
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push(tx);
        self.requested.set(self.requested.get() + 1);
        async move {
            let _ = rx.await;
        }
    }
}

/// Frame scheduler whose frames complete immediately.
#[derive(Clone, Default)]
pub struct ImmediateFrames {
    requested: Rc<Cell<usize>>,
}

impl ImmediateFrames {
    pub fn requested(&self) -> usize {
        self.requested.get()
    }
}

impl FrameScheduler for ImmediateFrames {
    fn next_frame(&self) -> impl Future<Output = ()> {
        self.requested.set(self.requested.get() + 1);
        async {}
    }
}
