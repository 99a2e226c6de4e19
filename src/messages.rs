//! Message catalog: symbolic key → status code and human message.
//!
//! Every [`RouterError`](crate::error::RouterError) kind names a key here. The
//! built-in table can be overridden per key from the `[messages]` config section.

use std::collections::{BTreeMap, HashMap};

use crate::config::schema::MessageConfig;

/// Key for the response sent to browser clients.
pub const BROWSER_VIEW: &str = "http.browser_view";

/// Key every unknown lookup falls back to.
pub const SERVICE_UNAVAILABLE: &str = "http.service_unavailable";

const DEFAULTS: &[(&str, u16, &str)] = &[
    (BROWSER_VIEW, 200, "This endpoint serves an API; use an API client to call it"),
    (SERVICE_UNAVAILABLE, 503, "Service unavailable"),
    ("router.content_type_unsupported", 415, "Unsupported content type"),
    ("router.method_missing", 400, "Request method is missing"),
    ("router.malformed_body", 400, "Received data is not valid"),
    ("router.method_not_allowed", 405, "Method not allowed"),
    ("router.invalid_uri", 400, "Invalid URI"),
    ("router.invalid_request_target", 400, "Invalid request target"),
    ("router.invalid_header_name", 500, "Invalid characters in header name"),
    ("router.codec_unbound", 500, "Response content type is not specified"),
    ("router.auth_denied", 401, "Unauthorized"),
    ("router.transport", 400, "Request could not be read"),
];

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub status: u16,
    pub message: String,
}

impl CatalogEntry {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Immutable key lookup table.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    entries: HashMap<String, CatalogEntry>,
    fallback: CatalogEntry,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let entries = DEFAULTS
            .iter()
            .map(|(key, status, message)| (key.to_string(), CatalogEntry::new(*status, *message)))
            .collect();
        Self {
            entries,
            fallback: CatalogEntry::new(503, "Service unavailable"),
        }
    }
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in table with `overrides` applied on top.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, MessageConfig>) -> Self {
        for (key, config) in overrides {
            let entry = CatalogEntry::new(config.status, config.message.clone());
            if key == SERVICE_UNAVAILABLE {
                self.fallback = entry.clone();
            }
            self.entries.insert(key.clone(), entry);
        }
        self
    }

    /// Entry for `key`, or the service-unavailable entry when unknown.
    pub fn lookup(&self, key: &str) -> &CatalogEntry {
        self.entries.get(key).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
