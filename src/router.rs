//! Radix-tree request router.
//!
//! One `matchit` tree per method, plus the shared application state handed
//! to every handler.
//!
//! # State
//!
//! [`Router::new`] takes ownership of the state and wraps it in an `Arc`
//! once. Each request clones that `Arc` into the handler, so handlers can
//! hold it across `.await` points and move it into `spawn_blocking`
//! closures without borrowing from the router.
//!
//! # Resolution order
//!
//! [`Router::dispatch`] resolves a request in this order:
//!
//! 1. The tree for the request's own method. A `HEAD` request that misses
//!    its own tree falls through to the `GET` tree; the server drops the
//!    body on the wire.
//! 2. If any *other* method's tree matches the path, `405 Method Not Allowed`.
//!    The fallback never sees these, so a wrong method on a known page is
//!    not reported as a missing page.
//! 3. The fallback handler, or a bare `404` when none is set.
//!
//! Within one tree, static segments win over parameters: `/paste/create`
//! beats `/paste/{id}` regardless of registration order.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::trace::AccessLog;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve),
/// or call [`Router::dispatch`] directly.
pub struct Router<S> {
    routes: HashMap<Method, MatchitRouter<BoxedHandler<S>>>,
    fallback: Option<BoxedHandler<S>>,
    access_log: Option<fn(&S) -> bool>,
    body_limit: Option<fn(&S) -> usize>,
    state: Arc<S>,
}

impl<S: Send + Sync + 'static> Router<S> {
    pub fn new(state: S) -> Self {
        Self {
            routes: HashMap::new(),
            fallback: None,
            access_log: None,
            body_limit: None,
            state: Arc::new(state),
        }
    }

    /// Register a handler for a method + path pair. Path parameters use
    /// `{name}` syntax.
    ///
    /// # Panics
    ///
    /// Panics if `path` conflicts with an already registered route.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler<S>) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Handler for paths no route matches. Defaults to a bare `404`.
    pub fn fallback(mut self, handler: impl Handler<S>) -> Self {
        self.fallback = Some(handler.into_boxed_handler());
        self
    }

    /// Log one access line per request whenever `enabled` returns `true`
    /// for the current state.
    pub fn access_log_when(mut self, enabled: fn(&S) -> bool) -> Self {
        self.access_log = Some(enabled);
        self
    }

    /// Caps request bodies at `limit(state)` bytes, evaluated per request.
    /// Larger bodies are dropped unread and the request is routed with
    /// [`Request::body_over_limit`] set. Unlimited by default.
    pub fn body_limit(mut self, limit: fn(&S) -> usize) -> Self {
        self.body_limit = Some(limit);
        self
    }

    pub(crate) fn max_body(&self) -> usize {
        self.body_limit.map_or(usize::MAX, |limit| limit(self.state.as_ref()))
    }

    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    /// Routes one request and produces one response.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let log = self.access_log
            .filter(|enabled| enabled(self.state.as_ref()))
            .map(|_| AccessLog::begin(&req));

        let found = self.lookup(req.method, &req.path).or_else(|| match req.method {
            Method::Head => self.lookup(Method::Get, &req.path),
            _ => None,
        });

        let response = match found {
            Some((handler, params)) => {
                req.params = params;
                handler.call(Arc::clone(&self.state), req).await
            }
            None if self.matches_other_method(req.method, &req.path) => {
                Response::status(Status::MethodNotAllowed)
            }
            None => match &self.fallback {
                Some(handler) => handler.call(Arc::clone(&self.state), req).await,
                None => Response::status(Status::NotFound),
            },
        };

        if let Some(log) = log {
            log.finish(response.status);
        }
        response
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(BoxedHandler<S>, HashMap<String, String>)> {
        let matched = self.routes.get(&method)?.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((Arc::clone(matched.value), params))
    }

    fn matches_other_method(&self, method: Method, path: &str) -> bool {
        self.routes.iter().any(|(m, tree)| *m != method && tree.at(path).is_ok())
    }
}
