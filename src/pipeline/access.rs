//! Controllers and the access gate they run behind.
//!
//! The `init` phase returns a [`Controller`]. The router hands it an
//! [`AccessGate`], and the controller calls [`AccessGate::authorize`] with the
//! [`Operation`] it is about to perform. Public operations never consult the
//! `access` callback.

use std::cell::Cell;

use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::http::{Request, Response};
use crate::pipeline::phase::{AccessFn, Stage};

/// An operation a controller asks permission for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    name: String,
    public: bool,
}

impl Operation {
    /// Operation open to everyone.
    pub fn public(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public: true,
        }
    }

    /// Operation the `access` callback may deny.
    pub fn restricted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_public(&self) -> bool {
        self.public
    }
}

/// Per-emission view of the access phase.
pub struct AccessGate<'a> {
    request: &'a Request,
    access: Option<&'a AccessFn>,
    config: &'a RouterConfig,
    stage: &'a Cell<Stage>,
}

impl<'a> AccessGate<'a> {
    pub(crate) fn new(
        request: &'a Request,
        access: Option<&'a AccessFn>,
        config: &'a RouterConfig,
        stage: &'a Cell<Stage>,
    ) -> Self {
        Self {
            request,
            access,
            config,
            stage,
        }
    }

    pub fn request(&self) -> &Request {
        self.request
    }

    pub fn config(&self) -> &RouterConfig {
        self.config
    }

    /// Admit `operation` or fail with `Unauthorized`.
    ///
    /// Only an explicit `Some(false)` from the callback denies.
    pub fn authorize(&self, operation: &Operation) -> Result<()> {
        self.stage.set(Stage::Access);
        let denied = !operation.is_public()
            && self
                .access
                .is_some_and(|access| access(self.request, self.config) == Some(false));
        if denied {
            return Err(RouterError::Unauthorized(operation.name().to_string()));
        }
        tracing::debug!(operation = operation.name(), "Operation authorized");
        self.stage.set(Stage::Handler);
        Ok(())
    }
}

/// Request handler produced by the `init` phase.
pub trait Controller {
    fn handle(self: Box<Self>, gate: &AccessGate<'_>) -> Result<Response>;
}

impl<F> Controller for F
where
    F: FnOnce(&AccessGate<'_>) -> Result<Response>,
{
    fn handle(self: Box<Self>, gate: &AccessGate<'_>) -> Result<Response> {
        (*self)(gate)
    }
}

/// Box a closure as a controller.
pub fn controller<F>(handler: F) -> Box<dyn Controller>
where
    F: FnOnce(&AccessGate<'_>) -> Result<Response> + 'static,
{
    Box::new(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn authorize_with(
        access: Option<&AccessFn>,
        operation: &Operation,
    ) -> (Result<()>, Stage) {
        let request = Request::new(Method::Get);
        let config = RouterConfig::default();
        let stage = Cell::new(Stage::Init);
        let gate = AccessGate::new(&request, access, &config, &stage);
        (gate.authorize(operation), stage.get())
    }

    #[test]
    fn test_denial_for_restricted_operation() {
        let deny: &AccessFn = &|_, _| Some(false);
        let (result, stage) = authorize_with(Some(deny), &Operation::restricted("orders.delete"));
        assert!(matches!(result, Err(RouterError::Unauthorized(name)) if name == "orders.delete"));
        assert_eq!(stage, Stage::Access);
    }

    #[test]
    fn test_public_operation_skips_callback() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let deny: &AccessFn = &|_, _| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Some(false)
        };
        let (result, stage) = authorize_with(Some(deny), &Operation::public("health"));
        assert!(result.is_ok());
        assert_eq!(stage, Stage::Handler);
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_undecided_and_missing_callback_allow() {
        let undecided: &AccessFn = &|_, _| None;
        assert!(authorize_with(Some(undecided), &Operation::restricted("x")).0.is_ok());
        assert!(authorize_with(None, &Operation::restricted("x")).0.is_ok());
    }

    #[test]
    fn test_closure_controller() {
        let request = Request::new(Method::Get);
        let config = RouterConfig::default();
        let stage = Cell::new(Stage::Access);
        let gate = AccessGate::new(&request, None, &config, &stage);

        let handler = controller(|gate| {
            gate.authorize(&Operation::public("echo"))?;
            Ok(Response::new().with_status(202, ""))
        });
        let response = handler.handle(&gate).unwrap();
        assert_eq!(response.status(), Some(202));
    }
}
