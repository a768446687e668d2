//! Storage namespaces derived from document identity.
//!
//! A page's logical name is the last segment of its URL path, cut at the
//! first `.` (`/quizzes/Quiz1.html` → `Quiz1`). Item records live in a
//! database named after the page and scalar keys are prefixed with it, so
//! two pages served from the same origin never see each other's state.

use std::fmt;

/// Storage schema version. Bumping it abandons previously stored rows.
pub const SCHEMA_VERSION: u32 = 1;

/// Logical name used when the path ends in `/` (a directory index).
pub const INDEX_DOCUMENT: &str = "index";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamespaceKey {
    document: String,
    version: u32,
}

impl NamespaceKey {
    #[must_use]
    pub fn new(document: impl Into<String>, version: u32) -> Self {
        Self { document: document.into(), version }
    }

    /// Derive the namespace from a URL path such as `location.pathname`.
    #[must_use]
    pub fn from_path(pathname: &str, version: u32) -> Self {
        let segment = pathname.rsplit('/').next().unwrap_or_default();
        let name = segment.split('.').next().unwrap_or_default();
        if name.is_empty() {
            Self::new(INDEX_DOCUMENT, version)
        } else {
            Self::new(name, version)
        }
    }

    /// The page's logical name; also the IndexedDB database name.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Prefix a scalar key with the document name (`Quiz1:visible-position`).
    #[must_use]
    pub fn scalar_key(&self, key: &str) -> String {
        format!("{}:{key}", self.document)
    }
}

impl fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.document, self.version)
    }
}

#[cfg(test)]
#[path = "namespace_test.rs"]
mod tests;
