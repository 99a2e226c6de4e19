//! Three-phase HTTP request/response pipeline with JSON and XML negotiation.

pub mod codec;
pub mod config;
pub mod echo;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod messages;
pub mod observability;
pub mod pipeline;
pub mod transport;

pub use codec::{ContentCodec, MediaType};
pub use config::schema::{RouterConfig, ServerConfig};
pub use error::{Result, RouterError};
pub use http::{HttpMessage, HttpServer, Method, Request, Response};
pub use lifecycle::Shutdown;
pub use messages::MessageCatalog;
pub use pipeline::{Emission, Phases, Router};
pub use transport::TransportEvent;
