//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → RouterConfig handed to the Router, the rest to the server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    HeaderSetting, ListenerConfig, MessageConfig, ObservabilityConfig, RouterConfig,
    SecurityConfig, ServerConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
