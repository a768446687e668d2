//! Live item enumeration.
//!
//! The registry is built once per load. It snapshots the checkboxes present
//! in the render and indexes companion fragments by item id so visibility
//! changes never have to query the document by id again.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::page::{ItemControl, Page, PageElement};

/// One checkbox as found at load time.
#[derive(Clone, Debug)]
pub struct LiveItem<C, E> {
    pub id: String,
    pub control: C,
    pub row: E,
}

impl<C: ItemControl, E> LiveItem<C, E> {
    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.control.is_checked()
    }
}

#[derive(Debug)]
pub struct ItemRegistry<C, E> {
    items: Vec<LiveItem<C, E>>,
    companions: HashMap<String, Vec<E>>,
    duplicates: Vec<String>,
}

impl<C: ItemControl, E: PageElement + Clone> ItemRegistry<C, E> {
    /// Enumerate the page's items and build the companion index.
    ///
    /// Duplicate ids are kept (every control still renders) but reported:
    /// their write-throughs share one record and the last change wins.
    pub fn enumerate<P>(page: &P) -> Self
    where
        P: Page<Control = C, Element = E>,
    {
        let mut items = Vec::new();
        let mut companions = HashMap::new();
        let mut duplicates = Vec::new();
        let mut seen = HashSet::new();

        for found in page.items() {
            let id = found.control.id();
            if seen.insert(id.clone()) {
                companions.insert(id.clone(), page.companions(&id));
            } else {
                warn!("duplicate item id '{id}'; last change wins for its record");
                duplicates.push(id.clone());
            }
            items.push(LiveItem { id, control: found.control, row: found.row });
        }

        Self { items, companions, duplicates }
    }
}

impl<C, E> ItemRegistry<C, E> {
    /// Items in document order.
    #[must_use]
    pub fn items(&self) -> &[LiveItem<C, E>] {
        &self.items
    }

    /// The set of live ids, used to find orphaned records.
    #[must_use]
    pub fn ids(&self) -> HashSet<&str> {
        self.items.iter().map(|item| item.id.as_str()).collect()
    }

    #[must_use]
    pub fn companions(&self, id: &str) -> &[E] {
        self.companions.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids that appeared more than once, one entry per extra occurrence.
    #[must_use]
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
