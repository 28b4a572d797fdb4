//! Route table and handler dispatch types.
//!
//! # Responsibilities
//! - Store registered routes in registration order
//! - Look up the first route matching a request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - O(n) scan; first match wins
//! - Explicit `None` rather than a silent default

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use futures_util::future::BoxFuture;

use crate::http::handlers::HandlerSettings;
use crate::http::request::RequestContext;
use crate::http::response::{HandlerFault, Reply};
use crate::observability::RequestLogger;
use crate::routing::matcher::{AndMatcher, Matcher, MethodMatcher, PathMatcher};

/// What a handler gets to work with.
#[derive(Debug, Clone)]
pub struct RequestScope {
    pub context: Arc<RequestContext>,
    pub log: RequestLogger,
    pub settings: Arc<HandlerSettings>,
}

pub type HandlerFuture = BoxFuture<'static, Result<Reply, HandlerFault>>;

/// A route handler. Implemented for any matching async fn.
pub trait Handler: Send + Sync {
    fn call(&self, scope: RequestScope) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestScope) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Reply, HandlerFault>> + Send + 'static,
{
    fn call(&self, scope: RequestScope) -> HandlerFuture {
        Box::pin(self(scope))
    }
}

/// A registered route.
pub struct Route {
    pub name: &'static str,
    matcher: Box<dyn Matcher>,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn handler(&self) -> Arc<dyn Handler> {
        self.handler.clone()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// Ordered route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `method` + exact `path`.
    pub fn route<H>(mut self, method: Method, path: &str, name: &'static str, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        let matcher = AndMatcher::new(vec![
            Box::new(MethodMatcher::new(method)),
            Box::new(PathMatcher::new(path)),
        ]);
        self.routes.push(Route {
            name,
            matcher: Box::new(matcher),
            handler: Arc::new(handler),
        });
        self
    }

    /// First route matching the request, if any.
    pub fn match_request(&self, req: &Request<Body>) -> Option<&Route> {
        self.routes.iter().find(|r| r.matcher.matches(req))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
