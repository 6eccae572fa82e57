//! Application-level configuration constants and the overridable DOM contract.

use serde::Deserialize;
use std::fmt;
use wasm_bindgen::JsValue;

// Timing
pub const TOAST_DURATION_MS: u32 = 2_000;
pub const COUNT_UP_DURATION_MS: f64 = 900.0;

// Fraction of a slide's area that must be visible before it counts as entered
pub const SLIDE_VISIBILITY_THRESHOLD: f64 = 0.6;

// Toast messages
pub const MSG_ADDED: &str = "Movie has been added to your list";
pub const MSG_REJECTED: &str = "Something went wrong, try again";
pub const MSG_NETWORK_ERROR: &str = "Network error, try again";

// Marks the POST as an async request so the server answers with JSON instead of a redirect
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

// Default DOM contract
pub const DEFAULT_FORM_SELECTOR: &str = ".add-to-list-form";
pub const DEFAULT_TOAST_ID: &str = "toast";
pub const DEFAULT_TOAST_VISIBLE_CLASS: &str = "show";
pub const DEFAULT_SLIDE_SELECTOR: &str = ".slide";
pub const DEFAULT_SLIDE_INDEX_ATTR: &str = "data-index";
pub const DEFAULT_DOT_SELECTOR: &str = ".dot";
pub const DEFAULT_ACTIVE_CLASS: &str = "active";
pub const DEFAULT_COUNT_UP_SELECTOR: &str = ".count-up";
pub const DEFAULT_COUNT_UP_TARGET_ATTR: &str = "data-target";

/// Selectors, classes and attributes the page markup is expected to carry.
///
/// Every field is optional when deserializing; missing ones fall back to the
/// defaults above. Keys are camelCase so a plain JS object can be passed to
/// `mount`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UiConfig {
    pub form_selector: String,
    pub toast_id: String,
    pub toast_visible_class: String,
    pub slide_selector: String,
    pub slide_index_attr: String,
    pub dot_selector: String,
    pub active_class: String,
    pub count_up_selector: String,
    pub count_up_target_attr: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            form_selector: DEFAULT_FORM_SELECTOR.to_string(),
            toast_id: DEFAULT_TOAST_ID.to_string(),
            toast_visible_class: DEFAULT_TOAST_VISIBLE_CLASS.to_string(),
            slide_selector: DEFAULT_SLIDE_SELECTOR.to_string(),
            slide_index_attr: DEFAULT_SLIDE_INDEX_ATTR.to_string(),
            dot_selector: DEFAULT_DOT_SELECTOR.to_string(),
            active_class: DEFAULT_ACTIVE_CLASS.to_string(),
            count_up_selector: DEFAULT_COUNT_UP_SELECTOR.to_string(),
            count_up_target_attr: DEFAULT_COUNT_UP_TARGET_ATTR.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Deserialize(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Deserialize(msg) => write!(f, "Invalid UI config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for JsValue {
    fn from(err: ConfigError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl UiConfig {
    /// Build a config from a JS value; `undefined`/`null` yield the defaults.
    pub fn from_js(value: JsValue) -> Result<Self, ConfigError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }
}
