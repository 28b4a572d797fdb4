//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! Request<Body>
//!     → CorrelationStage   (assign ID, log "Request received")
//!     → DispatchStage      (first matching route runs)
//!     → NotFoundStage      (404 when nothing matched)
//!     → ErrorFallbackStage (500 when a handler faulted)
//!     → Reply + x-correlation-id header
//! ```
//!
//! Phases: `Received → Dispatched → {Responded | NotFound → Responded |
//! Faulted → Responded}`. Every request ends in `Responded` exactly once.
//!
//! # Design Decisions
//! - Stages are an explicit ordered list, not nested middleware
//! - A stage answers `Respond`, `Continue` or `Fault`
//! - `Fault` skips straight to recovery; only stages after the faulting one
//!   get a chance to recover
//! - No retries: a fault is terminal for that request

pub mod stages;

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::http::handlers::HandlerSettings;
use crate::http::request::RequestContext;
use crate::http::response::{HandlerFault, Reply};
use crate::observability::{RequestLogger, StructuredLogger};
use crate::routing::RouteTable;

pub use stages::{CorrelationStage, DispatchStage, ErrorFallbackStage, NotFoundStage};

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    Dispatched,
    NotFound,
    Faulted,
    Responded,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Received => "RECEIVED",
            Phase::Dispatched => "DISPATCHED",
            Phase::NotFound => "NOT_FOUND",
            Phase::Faulted => "FAULTED",
            Phase::Responded => "RESPONDED",
        };
        f.write_str(name)
    }
}

/// What a stage decided.
#[derive(Debug)]
pub enum Outcome {
    /// Terminal response; later stages do not run.
    Respond(Reply),
    /// Nothing to do here, try the next stage.
    Continue,
    /// A handler failed; only recovery runs from here on.
    Fault(HandlerFault),
}

/// A single step in the pipeline.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn process<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, Outcome>;

    /// Turn a fault into a response. Stages that do not handle faults keep the default.
    fn recover(&self, _exchange: &mut Exchange, _fault: &HandlerFault) -> Option<Reply> {
        None
    }
}

/// Mutable per-request state carried through the stages.
pub struct Exchange {
    request: Request<Body>,
    logger: StructuredLogger,
    context: Option<Arc<RequestContext>>,
    matched_route: Option<&'static str>,
    history: Vec<Phase>,
}

impl Exchange {
    pub fn new(request: Request<Body>, logger: StructuredLogger) -> Self {
        Self {
            request,
            logger,
            context: None,
            matched_route: None,
            history: vec![Phase::Received],
        }
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn context(&self) -> Option<&Arc<RequestContext>> {
        self.context.as_ref()
    }

    /// Context for this request, captured on first use and never regenerated.
    pub fn ensure_context(&mut self) -> Arc<RequestContext> {
        match &self.context {
            Some(ctx) => ctx.clone(),
            None => {
                let ctx = Arc::new(RequestContext::capture(&self.request));
                self.context = Some(ctx.clone());
                ctx
            }
        }
    }

    /// Logger bound to this request's correlation ID.
    pub fn log(&mut self) -> RequestLogger {
        let ctx = self.ensure_context();
        self.logger.for_request(&ctx.correlation_id)
    }

    pub fn matched_route(&self) -> Option<&'static str> {
        self.matched_route
    }

    pub(crate) fn mark_matched(&mut self, name: &'static str) {
        self.matched_route = Some(name);
    }

    pub fn phase(&self) -> Phase {
        self.history.last().copied().unwrap_or(Phase::Received)
    }

    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    pub(crate) fn advance(&mut self, phase: Phase) {
        let from = self.phase();
        if from == phase {
            return;
        }
        tracing::debug!(
            correlation_id = self.context.as_ref().map(|c| c.correlation_id.as_str()),
            from = %from,
            to = %phase,
            "Pipeline phase change"
        );
        self.history.push(phase);
    }
}

/// Ordered chain of stages shared by all requests.
pub struct Pipeline {
    logger: StructuredLogger,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(logger: StructuredLogger, stages: Vec<Box<dyn Stage>>) -> Self {
        Self { logger, stages }
    }

    /// Correlation, dispatch, not-found, error fallback.
    pub fn standard(
        logger: StructuredLogger,
        routes: RouteTable,
        settings: Arc<HandlerSettings>,
    ) -> Self {
        Self::new(
            logger,
            vec![
                Box::new(CorrelationStage),
                Box::new(DispatchStage::new(routes, settings)),
                Box::new(NotFoundStage),
                Box::new(ErrorFallbackStage),
            ],
        )
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run a request through every stage and build the HTTP response.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let mut exchange = Exchange::new(request, self.logger.clone());
        let reply = self.drive(&mut exchange).await;
        let correlation_id = exchange.context().map(|c| c.correlation_id.clone());
        reply.into_response_with(correlation_id.as_ref())
    }

    /// Run the stages against an exchange, returning the single terminal reply.
    pub async fn drive(&self, exchange: &mut Exchange) -> Reply {
        for (index, stage) in self.stages.iter().enumerate() {
            match stage.process(exchange).await {
                Outcome::Continue => continue,
                Outcome::Respond(reply) => {
                    exchange.advance(Phase::Responded);
                    return reply;
                }
                Outcome::Fault(fault) => {
                    exchange.advance(Phase::Faulted);
                    let reply = self.recover(index, exchange, &fault);
                    exchange.advance(Phase::Responded);
                    return reply;
                }
            }
        }

        tracing::error!(
            stages = ?self.stage_names(),
            "Pipeline finished without a response"
        );
        exchange.advance(Phase::Responded);
        Reply::internal_error()
    }

    fn recover(&self, faulted_at: usize, exchange: &mut Exchange, fault: &HandlerFault) -> Reply {
        self.stages[faulted_at + 1..]
            .iter()
            .find_map(|stage| stage.recover(exchange, fault))
            .unwrap_or_else(|| {
                tracing::error!(
                    error = %fault,
                    stage = self.stages[faulted_at].name(),
                    "Fault reached end of pipeline unrecovered"
                );
                Reply::internal_error()
            })
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}
