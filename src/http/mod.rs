//! HTTP message model and server.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, limits, timeout)
//!     → TransportEvent → Router::emit
//!     → request.rs (immutable Request built by the assembler)
//!     → response.rs (immutable Response finalized through the codec)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Messages are values; every `with_*` returns a new one
//! - Header handling is shared through the `HttpMessage` trait
//! - Bodies are in-memory streams whose clones share one buffer

pub mod headers;
pub mod method;
pub mod request;
pub mod response;
pub mod server;
pub mod stream;
pub mod uri;

pub use headers::{Headers, HttpMessage};
pub use method::Method;
pub use request::{Request, UploadedFile};
pub use response::Response;
pub use server::HttpServer;
pub use stream::{Stream, StreamMode};
pub use uri::Uri;
