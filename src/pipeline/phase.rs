//! Phase callbacks and pipeline stages.

use std::fmt;

use crate::config::RouterConfig;
use crate::error::Result;
use crate::http::{Request, Response};
use crate::pipeline::access::Controller;

/// The three callback slots of a router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Builds the controller for a request.
    Init,
    /// Answers whether a restricted operation may run.
    Access,
    /// Turns the controller's result into the final response.
    Out,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Access => "access",
            Self::Out => "out",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a single emission currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    MethodGate,
    Init,
    Access,
    Handler,
    Out,
    Finalized,
    Failed,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::MethodGate => "method_gate",
            Self::Init => "init",
            Self::Access => "access",
            Self::Handler => "handler",
            Self::Out => "out",
            Self::Finalized => "finalized",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized | Self::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type InitFn =
    dyn Fn(&Request, Response, &RouterConfig) -> Result<Box<dyn Controller>> + Send + Sync;
pub type AccessFn = dyn Fn(&Request, &RouterConfig) -> Option<bool> + Send + Sync;
pub type OutFn = dyn Fn(Response, &RouterConfig) -> Result<Response> + Send + Sync;

/// Callbacks bound to a router. `init` and `out` are mandatory.
pub struct Phases {
    init: Box<InitFn>,
    access: Option<Box<AccessFn>>,
    out: Box<OutFn>,
}

impl Phases {
    pub fn new<I, O>(init: I, out: O) -> Self
    where
        I: Fn(&Request, Response, &RouterConfig) -> Result<Box<dyn Controller>>
            + Send
            + Sync
            + 'static,
        O: Fn(Response, &RouterConfig) -> Result<Response> + Send + Sync + 'static,
    {
        Self {
            init: Box::new(init),
            access: None,
            out: Box::new(out),
        }
    }

    /// Bind the access callback. Without one, every operation is allowed.
    pub fn with_access<A>(mut self, access: A) -> Self
    where
        A: Fn(&Request, &RouterConfig) -> Option<bool> + Send + Sync + 'static,
    {
        self.access = Some(Box::new(access));
        self
    }

    pub fn is_bound(&self, phase: Phase) -> bool {
        match phase {
            Phase::Init | Phase::Out => true,
            Phase::Access => self.access.is_some(),
        }
    }

    pub(crate) fn init(&self) -> &InitFn {
        self.init.as_ref()
    }

    pub(crate) fn access(&self) -> Option<&AccessFn> {
        self.access.as_deref()
    }

    pub(crate) fn out(&self) -> &OutFn {
        self.out.as_ref()
    }
}

impl fmt::Debug for Phases {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phases")
            .field("access", &self.access.is_some())
            .finish_non_exhaustive()
    }
}
