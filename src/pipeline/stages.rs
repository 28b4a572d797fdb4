//! The four standard pipeline stages.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::fields;
use crate::http::handlers::HandlerSettings;
use crate::http::response::{HandlerFault, Reply};
use crate::pipeline::{Exchange, Outcome, Phase, Stage};
use crate::routing::{RequestScope, RouteTable};

/// Assigns the correlation ID and logs the inbound request.
#[derive(Debug, Default, Clone, Copy)]
pub struct CorrelationStage;

impl Stage for CorrelationStage {
    fn name(&self) -> &'static str {
        "correlation"
    }

    fn process<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let ctx = exchange.ensure_context();
            exchange.log().info("Request received", ctx.request_fields());
            Outcome::Continue
        })
    }
}

/// Runs the first route whose matcher accepts the request.
#[derive(Debug)]
pub struct DispatchStage {
    routes: RouteTable,
    settings: Arc<HandlerSettings>,
}

impl DispatchStage {
    pub fn new(routes: RouteTable, settings: Arc<HandlerSettings>) -> Self {
        Self { routes, settings }
    }
}

impl Stage for DispatchStage {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    fn process<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            exchange.advance(Phase::Dispatched);

            let Some(route) = self.routes.match_request(exchange.request()) else {
                return Outcome::Continue;
            };
            exchange.mark_matched(route.name);

            let scope = RequestScope {
                context: exchange.ensure_context(),
                log: exchange.log(),
                settings: self.settings.clone(),
            };
            let handler = route.handler();

            match AssertUnwindSafe(handler.call(scope)).catch_unwind().await {
                Ok(Ok(reply)) => Outcome::Respond(reply),
                Ok(Err(fault)) => Outcome::Fault(fault),
                Err(payload) => Outcome::Fault(HandlerFault::from_panic(payload.as_ref())),
            }
        })
    }
}

/// Answers 404 when dispatch found no route.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotFoundStage;

impl Stage for NotFoundStage {
    fn name(&self) -> &'static str {
        "not_found"
    }

    fn process<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            if exchange.matched_route().is_some() {
                return Outcome::Continue;
            }
            exchange.advance(Phase::NotFound);

            let ctx = exchange.ensure_context();
            exchange.log().warn(
                "Route not found",
                fields! {
                    "method" => ctx.method.as_str(),
                    "url" => ctx.url,
                    "clientAddress" => ctx.client_address_value(),
                },
            );
            Outcome::Respond(Reply::not_found(ctx.method.as_str(), &ctx.url))
        })
    }
}

/// Logs handler faults and answers with a generic 500.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorFallbackStage;

impl Stage for ErrorFallbackStage {
    fn name(&self) -> &'static str {
        "error_fallback"
    }

    fn process<'a>(&'a self, _exchange: &'a mut Exchange) -> BoxFuture<'a, Outcome> {
        Box::pin(async { Outcome::Continue })
    }

    fn recover(&self, exchange: &mut Exchange, fault: &HandlerFault) -> Option<Reply> {
        exchange.log().error(
            "Unhandled error in application",
            fields! {
                "errorType" => fault.kind(),
                "error" => fault.message(),
                "stack" => fault.trace(),
            },
        );
        Some(Reply::internal_error())
    }
}
