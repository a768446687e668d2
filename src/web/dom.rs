//! `web-sys` implementation of the page traits.

use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, HtmlCollection, HtmlElement, HtmlInputElement, Window};

use crate::config::PageConfig;
use crate::page::{Bounds, ChangeSink, ItemChange, ItemControl, Page, PageElement, PageItem};

use super::js_error;

/// How an element is hidden.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HideMode {
    /// `display: none`; the element leaves the layout (rows, comments).
    Collapse,
    /// `visibility: hidden`; the element keeps its space (answer cells).
    Conceal,
}

#[derive(Clone, Debug)]
pub struct DomElement {
    element: HtmlElement,
    mode: HideMode,
}

impl DomElement {
    fn collapsing(element: HtmlElement) -> Self {
        Self { element, mode: HideMode::Collapse }
    }

    fn concealing(element: HtmlElement) -> Self {
        Self { element, mode: HideMode::Conceal }
    }
}

impl PageElement for DomElement {
    fn set_visible(&self, visible: bool) {
        let style = self.element.style();
        let result = match (self.mode, visible) {
            (HideMode::Collapse, true) => style.remove_property("display").map(drop),
            (HideMode::Collapse, false) => style.set_property("display", "none"),
            (HideMode::Conceal, true) => style.set_property("visibility", "visible"),
            (HideMode::Conceal, false) => style.set_property("visibility", "hidden"),
        };
        if let Err(e) = result {
            warn!("could not change visibility of #{}: {}", self.element.id(), js_error(&e));
        }
    }

    fn is_visible(&self) -> bool {
        let style = self.element.style();
        match self.mode {
            HideMode::Collapse => style.get_property_value("display").map_or(true, |v| v != "none"),
            HideMode::Conceal => style.get_property_value("visibility").map_or(true, |v| v != "hidden"),
        }
    }

    fn bounds(&self) -> Bounds {
        let rect = self.element.get_bounding_client_rect();
        Bounds { top: rect.top(), bottom: rect.bottom() }
    }

    fn width(&self) -> f64 {
        self.element.get_bounding_client_rect().width()
    }

    fn set_width(&self, width: f64) {
        if let Err(e) = self.element.style().set_property("width", &format!("{width}px")) {
            warn!("could not pin width of #{}: {}", self.element.id(), js_error(&e));
        }
    }

    fn scroll_into_view(&self) {
        self.element.scroll_into_view();
    }
}

#[derive(Clone, Debug)]
pub struct DomControl {
    input: HtmlInputElement,
}

impl ItemControl for DomControl {
    fn id(&self) -> String {
        self.input.id()
    }

    fn is_checked(&self) -> bool {
        self.input.checked()
    }

    fn set_checked(&self, checked: bool) {
        self.input.set_checked(checked);
    }

    fn subscribe(&self, sink: ChangeSink) {
        let input = self.input.clone();
        let on_change = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            let change = ItemChange { id: input.id(), checked: input.checked() };
            if !sink.send(change) {
                debug!("'{}' changed after session close; not persisted", input.id());
            }
        });
        if let Err(e) = self.input.add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref()) {
            warn!("could not watch '{}': {}", self.input.id(), js_error(&e));
        }
        // The listener lives as long as the checkbox.
        on_change.forget();
    }
}

/// The current document, read through the configured selectors.
#[derive(Clone)]
pub struct DomPage {
    window: Window,
    document: Document,
    config: Rc<PageConfig>,
}

impl DomPage {
    #[must_use]
    pub fn new(window: Window, document: Document, config: Rc<PageConfig>) -> Self {
        Self { window, document, config }
    }

    fn row_for(&self, input: &HtmlInputElement) -> DomElement {
        match input.closest(&self.config.row_selector) {
            Ok(Some(row)) => {
                if let Ok(row) = row.dyn_into::<HtmlElement>() {
                    return DomElement::collapsing(row);
                }
            }
            Ok(None) => debug!("'{}' has no {} container", input.id(), self.config.row_selector),
            Err(e) => warn!("bad row selector '{}': {}", self.config.row_selector, js_error(&e)),
        }
        DomElement::collapsing(HtmlElement::from(input.clone()))
    }

    fn by_class(&self, class: &str, wrap: fn(HtmlElement) -> DomElement) -> Vec<DomElement> {
        collect(&self.document.get_elements_by_class_name(class), wrap)
    }
}

fn collect(collection: &HtmlCollection, wrap: fn(HtmlElement) -> DomElement) -> Vec<DomElement> {
    let mut out = Vec::new();
    for index in 0..collection.length() {
        let Some(element) = collection.item(index) else {
            continue;
        };
        if let Ok(element) = element.dyn_into::<HtmlElement>() {
            out.push(wrap(element));
        }
    }
    out
}

impl Page for DomPage {
    type Control = DomControl;
    type Element = DomElement;

    fn items(&self) -> Vec<PageItem<DomControl, DomElement>> {
        let nodes = match self.document.query_selector_all(&self.config.checkbox_selector) {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!("bad checkbox selector '{}': {}", self.config.checkbox_selector, js_error(&e));
                return Vec::new();
            }
        };

        let mut items = Vec::new();
        for index in 0..nodes.length() {
            let Some(node) = nodes.item(index) else {
                continue;
            };
            let Ok(input) = node.dyn_into::<HtmlInputElement>() else {
                continue;
            };
            let row = self.row_for(&input);
            items.push(PageItem { control: DomControl { input }, row });
        }
        items
    }

    fn companions(&self, id: &str) -> Vec<DomElement> {
        self.by_class(id, DomElement::collapsing)
    }

    fn comments(&self) -> Vec<DomElement> {
        self.by_class(&self.config.comment_class, DomElement::collapsing)
    }

    fn answers(&self) -> Vec<DomElement> {
        self.by_class(&self.config.answer_class, DomElement::concealing)
    }

    fn layout_anchor(&self) -> Option<DomElement> {
        self.element_by_id(&self.config.layout_anchor_id)
    }

    fn viewport_height(&self) -> f64 {
        match self.window.inner_height() {
            Ok(height) => height.as_f64().unwrap_or(0.0),
            Err(e) => {
                warn!("could not read innerHeight: {}", js_error(&e));
                0.0
            }
        }
    }

    fn element_by_id(&self, id: &str) -> Option<DomElement> {
        let element = self.document.get_element_by_id(id)?;
        match element.dyn_into::<HtmlElement>() {
            Ok(element) => Some(DomElement::collapsing(element)),
            Err(_) => None,
        }
    }
}
