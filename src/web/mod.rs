//! Browser bindings and entry point (`hydrate` feature).
//!
//! SYSTEM CONTEXT
//! ==============
//! The generated quiz page loads this crate as a WASM module. On start it
//! reads the optional embedded config, initialises console logging, and once
//! the DOM is ready builds a [`Session`] over IndexedDB, `localStorage` and
//! the page's checkboxes. The menu entries, `visibilitychange` and
//! `pagehide` are wired to session actions; everything else on the page
//! (dropdown menus, footer, scroll percentage) is left to its own scripts.

mod dom;
mod frames;
mod idb;
mod scalars;

use std::rc::Rc;

use futures::future::LocalFutureObj;
use futures::task::{LocalSpawn, SpawnError};
use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, PageTransitionEvent, VisibilityState, Window};

use crate::config::{ActionIds, PageConfig};
use crate::error::ConfigError;
use crate::namespace::NamespaceKey;
use crate::session::Session;

pub use dom::{DomControl, DomElement, DomPage};
pub use frames::AnimationFrames;
pub use idb::{IndexedDbBackend, IndexedDbStore};
pub use scalars::LocalScalars;

/// Element id of the optional `<script type="application/json">` config.
pub const CONFIG_ELEMENT_ID: &str = "quizmark-config";

pub type BrowserSession = Session<IndexedDbStore, DomPage, LocalScalars>;

/// Runs futures on the browser microtask queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

pub(crate) fn js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };

    let (config, config_error) = load_config(&document);
    init_logging(&config);
    if let Some(e) = config_error {
        warn!("ignoring #{CONFIG_ELEMENT_ID}, using defaults: {e}");
    }

    if document.ready_state() == "loading" {
        let boot_document = document.clone();
        let on_ready = Closure::once_into_js(move || {
            wasm_bindgen_futures::spawn_local(boot(window, boot_document, config));
        });
        if let Err(e) = document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref()) {
            warn!("could not wait for DOMContentLoaded: {}", js_error(&e));
        }
    } else {
        wasm_bindgen_futures::spawn_local(boot(window, document, config));
    }
}

fn load_config(document: &Document) -> (PageConfig, Option<ConfigError>) {
    let raw = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content());
    match raw {
        None => (PageConfig::default(), None),
        Some(raw) => match PageConfig::from_json(&raw) {
            Ok(config) => (config, None),
            Err(e) => (PageConfig::default(), Some(e)),
        },
    }
}

fn init_logging(config: &PageConfig) {
    let level = config.level().unwrap_or(log::Level::Info);
    if console_log::init_with_level(level).is_err() {
        debug!("console logger already installed");
    }
}

async fn boot(window: Window, document: Document, config: PageConfig) {
    let pathname = match window.location().pathname() {
        Ok(pathname) => pathname,
        Err(e) => {
            warn!("could not read location.pathname: {}", js_error(&e));
            String::new()
        }
    };
    let namespace = NamespaceKey::from_path(&pathname, config.schema_version);
    let config = Rc::new(config);

    let page = DomPage::new(window.clone(), document.clone(), Rc::clone(&config));
    let backend = IndexedDbBackend::new(window.clone(), config.object_store.clone());
    let scalars = LocalScalars::from_window(&window);
    let session: Rc<BrowserSession> =
        Rc::new(Session::start(&backend, page, scalars, namespace, &BrowserSpawner).await);

    wire_actions(&document, &config.actions, &session);
    wire_lifecycle(&window, &document, &session);

    session.restore_visible_position(&AnimationFrames::new(window)).await;
}

fn wire_actions(document: &Document, actions: &ActionIds, session: &Rc<BrowserSession>) {
    let clear = Rc::clone(session);
    on_click(document, &actions.clear_all, move || {
        let session = Rc::clone(&clear);
        wasm_bindgen_futures::spawn_local(async move {
            session.clear_all().await;
        });
    });

    let dim = Rc::clone(session);
    on_click(document, &actions.toggle_unchecked, move || {
        dim.toggle_dim_unchecked();
    });

    let answers = Rc::clone(session);
    on_click(document, &actions.toggle_answers, move || answers.toggle_answers());
}

fn on_click(document: &Document, id: &str, mut action: impl FnMut() + 'static) {
    let Some(element) = document.get_element_by_id(id) else {
        debug!("no #{id} on this page; action not wired");
        return;
    };
    let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        event.prevent_default();
        action();
    });
    if let Err(e) = element.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref()) {
        warn!("could not wire #{id}: {}", js_error(&e));
    }
    callback.forget();
}

fn wire_lifecycle(window: &Window, document: &Document, session: &Rc<BrowserSession>) {
    let hide_session = Rc::clone(session);
    let hide_document = document.clone();
    let on_visibility = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        if hide_document.visibility_state() == VisibilityState::Hidden {
            hide_session.save_visible_position();
        }
    });
    if let Err(e) = document.add_event_listener_with_callback("visibilitychange", on_visibility.as_ref().unchecked_ref())
    {
        warn!("could not watch visibilitychange: {}", js_error(&e));
    }
    on_visibility.forget();

    // A page kept in the back/forward cache comes back with its session intact.
    let close_session = Rc::clone(session);
    let on_pagehide = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let persisted = event.dyn_ref::<PageTransitionEvent>().is_some_and(PageTransitionEvent::persisted);
        if !persisted {
            close_session.close();
        }
    });
    if let Err(e) = window.add_event_listener_with_callback("pagehide", on_pagehide.as_ref().unchecked_ref()) {
        warn!("could not watch pagehide: {}", js_error(&e));
    }
    on_pagehide.forget();
}
