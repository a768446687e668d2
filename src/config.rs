//! Page configuration: which elements to look for and where to store state.
//!
//! Every field has a default matching the markup produced by the quiz page
//! generator, so a page without an embedded config works unchanged. A page
//! may override any subset of fields with a JSON object (camelCase keys).

use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::namespace::SCHEMA_VERSION;

pub const DEFAULT_CHECKBOX_SELECTOR: &str = "input[type=\"checkbox\"]";
pub const DEFAULT_ROW_SELECTOR: &str = "tr.item";
pub const DEFAULT_COMMENT_CLASS: &str = "comment";
pub const DEFAULT_ANSWER_CLASS: &str = "answer-text";
pub const DEFAULT_LAYOUT_ANCHOR_ID: &str = "question-column";
pub const DEFAULT_OBJECT_STORE: &str = "checkboxes";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Element ids of the menu entries the session wires actions to.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionIds {
    pub clear_all: String,
    pub toggle_unchecked: String,
    pub toggle_answers: String,
}

impl Default for ActionIds {
    fn default() -> Self {
        Self {
            clear_all: "clear-checkboxes".to_owned(),
            toggle_unchecked: "toggle-unchecked".to_owned(),
            toggle_answers: "toggle-answers".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageConfig {
    /// CSS selector matching every tracked checkbox.
    pub checkbox_selector: String,
    /// CSS selector for the row container that encloses a checkbox.
    pub row_selector: String,
    /// Class shared by the page-wide comment rows.
    pub comment_class: String,
    /// Class shared by the answer cells the reveal toggle flips.
    pub answer_class: String,
    /// Id of the column whose width is pinned while rows are hidden.
    pub layout_anchor_id: String,
    /// IndexedDB object store holding item records.
    pub object_store: String,
    pub schema_version: u32,
    pub log_level: String,
    pub actions: ActionIds,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            checkbox_selector: DEFAULT_CHECKBOX_SELECTOR.to_owned(),
            row_selector: DEFAULT_ROW_SELECTOR.to_owned(),
            comment_class: DEFAULT_COMMENT_CLASS.to_owned(),
            answer_class: DEFAULT_ANSWER_CLASS.to_owned(),
            layout_anchor_id: DEFAULT_LAYOUT_ANCHOR_ID.to_owned(),
            object_store: DEFAULT_OBJECT_STORE.to_owned(),
            schema_version: SCHEMA_VERSION,
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
            actions: ActionIds::default(),
        }
    }
}

impl PageConfig {
    /// Parse and validate a JSON config object. Missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// The configured log level.
    pub fn level(&self) -> Result<log::Level, ConfigError> {
        log::Level::from_str(&self.log_level).map_err(|_| ConfigError::Invalid {
            field: "logLevel",
            reason: format!("unknown level '{}'", self.log_level),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("checkboxSelector", &self.checkbox_selector),
            ("rowSelector", &self.row_selector),
            ("commentClass", &self.comment_class),
            ("answerClass", &self.answer_class),
            ("objectStore", &self.object_store),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid { field, reason: "must not be empty".to_owned() });
            }
        }
        if self.schema_version == 0 {
            return Err(ConfigError::Invalid { field: "schemaVersion", reason: "must be at least 1".to_owned() });
        }
        self.level()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
