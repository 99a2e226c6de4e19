//! The emission state machine.
//!
//! # Data Flow
//! ```text
//! TransportEvent
//!     → prepare response (codec, Content-Type, configured + CORS headers)
//!     → [Accept: text/html] → browser view → Finalized
//!     → MethodGate (resolve, check allowed set, assemble Request)
//!     → Init (controller) → Access/Handler (controller runs behind the gate)
//!     → Out (final response) → to_response → Finalized
//!
//! any error ─→ FailureTranslator onto the prepared response → Failed
//!           └→ that finalize fails too → Failed, undelivered
//! ```
//!
//! # Design Decisions
//! - One emission runs synchronously start to finish; the router is shared
//!   immutably across threads
//! - Errors are converted only here, at the single boundary
//! - The prepared response is kept so error output carries the same headers

use std::cell::Cell;
use std::sync::Arc;
use std::time::Instant;

use crate::codec::ContentCodec;
use crate::config::{HeaderSetting, RouterConfig};
use crate::error::{Result, RouterError};
use crate::http::{Headers, HttpMessage, Response};
use crate::messages::{MessageCatalog, BROWSER_VIEW};
use crate::observability::metrics;
use crate::pipeline::access::AccessGate;
use crate::pipeline::assembler::RequestAssembler;
use crate::pipeline::failure::FailureTranslator;
use crate::pipeline::phase::{Phases, Stage};
use crate::transport::TransportEvent;

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";

/// Status reported for an emission that produced no output.
const UNDELIVERED_STATUS: u16 = 500;

/// Runs the three phases for each transport event.
#[derive(Debug)]
pub struct Router {
    config: RouterConfig,
    phases: Phases,
    messages: MessageCatalog,
    codec: Arc<dyn ContentCodec>,
}

impl Router {
    pub fn new(config: RouterConfig, phases: Phases) -> Self {
        let codec = config.content_type.codec();
        Self {
            config,
            phases,
            messages: MessageCatalog::default(),
            codec,
        }
    }

    pub fn with_messages(mut self, messages: MessageCatalog) -> Self {
        self.messages = messages;
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    /// Process one event to a finalized response.
    pub fn emit(&self, event: &TransportEvent) -> Emission {
        let started = Instant::now();
        let stage = Cell::new(Stage::Idle);
        let prepared = self.prepare_response();

        let outcome = if event.accepts_html() {
            self.browser_view(&prepared)
        } else {
            self.run(event, prepared.clone(), &stage)
        };

        let emission = match outcome {
            Ok(response) => Emission {
                response,
                stage: Stage::Finalized,
                failed_at: None,
                failure: None,
                delivered: true,
            },
            Err(error) => self.fail(error, stage.get(), &prepared),
        };

        metrics::record_emission(
            event.method.as_deref().unwrap_or(""),
            emission.status(),
            emission.failed_at.unwrap_or(emission.stage).as_str(),
            started,
        );
        emission
    }

    fn run(&self, event: &TransportEvent, response: Response, stage: &Cell<Stage>) -> Result<Response> {
        enter(stage, Stage::MethodGate);
        let method = RequestAssembler::method(event)?;
        if !self.config.allows(method) {
            return Err(RouterError::MethodNotAllowed(method.to_string()));
        }
        let request = RequestAssembler::new(Arc::clone(&self.codec)).assemble(method, event)?;

        enter(stage, Stage::Init);
        let controller = (self.phases.init())(&request, response, &self.config)?;

        // authorize() moves the stage on to Handler
        enter(stage, Stage::Access);
        let gate = AccessGate::new(&request, self.phases.access(), &self.config, stage);
        let result = controller.handle(&gate)?;

        enter(stage, Stage::Out);
        let response = (self.phases.out())(result, &self.config)?;
        response.to_response()?;
        enter(stage, Stage::Finalized);
        Ok(response)
    }

    fn browser_view(&self, prepared: &Response) -> Result<Response> {
        let entry = self.messages.lookup(BROWSER_VIEW);
        let mut response = prepared
            .with_status(entry.status, "")
            .with_message(entry.message.clone());
        if let Some(payload) = &self.config.browser_view {
            response = response.with_data(payload.clone());
        }
        response.to_response()?;
        Ok(response)
    }

    fn fail(&self, error: RouterError, at: Stage, prepared: &Response) -> Emission {
        tracing::warn!(kind = error.key(), stage = %at, error = %error, "Emission failed");
        let translator = FailureTranslator::new(&self.messages);
        match translator.finalize(&error, prepared) {
            Ok(response) => Emission {
                response,
                stage: Stage::Failed,
                failed_at: Some(at),
                failure: Some(error),
                delivered: true,
            },
            Err(fatal) => {
                tracing::error!(
                    kind = error.key(),
                    stage = %at,
                    error = %fatal,
                    "Error response could not be finalized; halting without output"
                );
                Emission {
                    response: translator.translate(&error, prepared),
                    stage: Stage::Failed,
                    failed_at: Some(at),
                    failure: Some(error),
                    delivered: false,
                }
            }
        }
    }

    /// The in-flight response every emission starts from.
    fn prepare_response(&self) -> Response {
        let content_type = self.config.content_type.header_value(&self.config.charset);
        let mut response = Response::new()
            .with_codec(Arc::clone(&self.codec))
            .with_header("Content-Type", content_type);

        for (name, setting) in &self.config.headers {
            response = match setting {
                HeaderSetting::Single(value) => response.with_header(name, value.clone()),
                HeaderSetting::Multi(values) => values
                    .iter()
                    .fold(response, |r, value| r.with_added_header(name, value.clone())),
            };
        }

        if let Some(origin) = &self.config.allowed_origin {
            response = response.with_header(ALLOW_ORIGIN, origin.clone());
        }
        if let Some(methods) = &self.config.allowed_methods {
            response = methods
                .iter()
                .fold(response, |r, method| r.with_added_header(ALLOW_METHODS, method.as_str()));
        }
        response
    }
}

fn enter(stage: &Cell<Stage>, next: Stage) {
    tracing::debug!(from = %stage.get(), to = %next, "Stage transition");
    stage.set(next);
}

/// Result of one [`Router::emit`] call.
#[derive(Debug)]
pub struct Emission {
    response: Response,
    stage: Stage,
    failed_at: Option<Stage>,
    failure: Option<RouterError>,
    delivered: bool,
}

impl Emission {
    /// The finalized response, or the translated one when undelivered.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// `Finalized` or `Failed`.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Stage that raised the failure, if any.
    pub fn failed_at(&self) -> Option<Stage> {
        self.failed_at
    }

    pub fn failure(&self) -> Option<&RouterError> {
        self.failure.as_ref()
    }

    /// False when even the error response could not be finalized.
    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Wire status: the response status (200 when unset), or 500 when undelivered.
    ///
    /// An unset status still serializes as `null` in the envelope, so the two can differ.
    pub fn status(&self) -> u16 {
        if self.delivered {
            self.response.status().unwrap_or(200)
        } else {
            UNDELIVERED_STATUS
        }
    }

    pub fn headers(&self) -> &Headers {
        self.response.headers()
    }

    /// Bytes written by finalize; empty when undelivered.
    pub fn body(&self) -> Vec<u8> {
        if !self.delivered {
            return Vec::new();
        }
        self.response.body().to_bytes().unwrap_or_default()
    }
}
