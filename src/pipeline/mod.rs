//! Three-phase request pipeline.
//!
//! # Data Flow
//! ```text
//! TransportEvent
//!     → assembler.rs (method, query/body/files → Request)
//!     → phase.rs init callback → Controller
//!     → access.rs AccessGate (optional access callback)
//!     → phase.rs out callback → Response
//!     → router.rs finalize, or failure.rs on any error
//! ```
//!
//! # Design Decisions
//! - `init` and `out` are required at construction; `access` is optional
//! - Phase results are typed, so no runtime shape checks exist
//! - Configuration is passed to every phase by reference, never global

pub mod access;
pub mod assembler;
pub mod failure;
pub mod phase;
pub mod router;

pub use access::{controller, AccessGate, Controller, Operation};
pub use assembler::RequestAssembler;
pub use failure::FailureTranslator;
pub use phase::{Phase, Phases, Stage};
pub use router::{Emission, Router};
