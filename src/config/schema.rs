//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::MediaType;
use crate::http::Method;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Pipeline settings: content type, allowed methods, static headers.
    pub router: RouterConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Per-key overrides of the message catalog.
    pub messages: BTreeMap<String, MessageConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// A configured header: one value, or a list applied value by value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HeaderSetting {
    Single(String),
    Multi(Vec<String>),
}

impl From<&str> for HeaderSetting {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for HeaderSetting {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for HeaderSetting {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

/// Pipeline configuration, fixed once the router is built.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Negotiated wire format for every response.
    pub content_type: MediaType,

    /// Charset advertised in `Content-Type`.
    pub charset: String,

    /// Accepted methods; `None` accepts the defaults and sends no CORS methods header.
    pub allowed_methods: Option<Vec<Method>>,

    /// Value for `Access-Control-Allow-Origin`.
    pub allowed_origin: Option<String>,

    /// Static headers added to every response.
    pub headers: BTreeMap<String, HeaderSetting>,

    /// Payload returned to browser clients.
    pub browser_view: Option<Value>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            content_type: MediaType::Json,
            charset: "UTF-8".to_string(),
            allowed_methods: None,
            allowed_origin: None,
            headers: BTreeMap::new(),
            browser_view: None,
        }
    }
}

impl RouterConfig {
    pub fn with_content_type(mut self, content_type: MediaType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_allowed_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed_methods = Some(methods.into_iter().collect());
        self
    }

    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = Some(origin.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<HeaderSetting>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<HeaderSetting>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_browser_view(mut self, payload: Value) -> Self {
        self.browser_view = Some(payload);
        self
    }

    /// The effective allowed set.
    ///
    /// With no list configured this is [`Method::DEFAULT_ALLOWED`], not an empty set:
    /// every common method is accepted until the operator narrows it.
    pub fn allowed_methods(&self) -> &[Method] {
        self.allowed_methods
            .as_deref()
            .unwrap_or(&Method::DEFAULT_ALLOWED)
    }

    pub fn allows(&self, method: Method) -> bool {
        self.allowed_methods().contains(&method)
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Override for one message catalog key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageConfig {
    pub status: u16,
    pub message: String,
}
