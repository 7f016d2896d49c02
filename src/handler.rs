//! Handler trait and type erasure.
//!
//! The router stores handlers of many concrete types in one table, so each
//! is boxed behind [`ErasedHandler`]:
//!
//! ```text
//! async fn show(state: Arc<AppState>, req: Request) -> Response { … }
//!        ↓ router.on(Method::Get, "/paste/{id}", show)
//! Arc::new(FnHandler(show))               stored as BoxedHandler<AppState>
//!        ↓ at request time
//! handler.call(state, req)                one Arc clone + one vtable call
//! ```
//!
//! # State passing
//!
//! Every handler receives the router's shared state as an `Arc<S>`, owned,
//! not borrowed. The returned future must be `'static` to be boxed, and a
//! borrow of the router could not outlive the call that made it. Handlers
//! that touch the paste store hand the `Arc` straight to `spawn_blocking`.
//!
//! # Sealing
//!
//! [`Handler`] is implemented once, as a blanket impl over async functions
//! with the signature above, and sealed so no other impl can appear. The
//! compiler then reports a mismatched handler at the `router.on(..)` call
//! rather than somewhere inside the erasure machinery.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A boxed future resolving to a [`Response`]. `Send + 'static` so tokio can
/// move it between worker threads.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// `#[doc(hidden)] pub` because it appears in [`Handler::into_boxed_handler`].
#[doc(hidden)]
pub trait ErasedHandler<S> {
    fn call(&self, state: Arc<S>, req: Request) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedHandler<S> = Arc<dyn ErasedHandler<S> + Send + Sync + 'static>;

/// Implemented for every valid route handler, i.e. any
///
/// ```text
/// async fn name(state: Arc<S>, req: Request) -> impl IntoResponse
/// ```
///
/// Sealed: only the blanket impl below satisfies it.
pub trait Handler<S>: private::Sealed<S> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler<S>;
}

mod private {
    pub trait Sealed<S> {}
}

impl<F, Fut, R, S> private::Sealed<S> for F
where
    F: Fn(Arc<S>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R, S> Handler<S> for F
where
    F: Fn(Arc<S>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
    S: 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler<S> {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R, S> ErasedHandler<S> for FnHandler<F>
where
    F: Fn(Arc<S>, Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, state: Arc<S>, req: Request) -> BoxFuture {
        let fut = (self.0)(state, req);
        Box::pin(async move { fut.await.into_response() })
    }
}
