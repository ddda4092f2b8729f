//! Middleware layer.
//!
//! Middleware intercepts a call on its way in and on its way out and is the
//! right place for cross-cutting concerns: auditing, tracing, request-id
//! injection, header inspection.
//!
//! A call travels through the stack like this:
//!
//! ```text
//! server ── HttpContext ──▶ layer 0 ──▶ layer 1 ──▶ … ──▶ Endpoint (router)
//!                            │ next.run(cx)  │ next.run(cx)       │
//!        ◀── Result<(), BoxError> ◀──────────┴────────────────────┘
//! ```
//!
//! Every layer gets `&mut HttpContext` and a [`Next`] that runs the rest of
//! the stack. A layer may change the request body or the response sink
//! before calling `next`, and read them back afterwards. Errors returned by
//! `next` belong to the caller; a layer that observes one should return it.
//!
//! Built-in middleware:
//! - [`audit::AuditLayer`]: correlated received/responded log entries

pub mod audit;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::HttpContext;
use crate::error::BoxError;

/// A heap-allocated, type-erased future borrowing for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What every stage of the pipeline resolves to.
pub type HandlerResult = Result<(), BoxError>;

/// The innermost stage of a pipeline: something that fills in the response.
///
/// [`Router`](crate::Router) is the endpoint the server uses. Closures can be
/// turned into endpoints with [`endpoint_fn`].
pub trait Endpoint: Send + Sync + 'static {
    fn call<'a>(&'a self, cx: &'a mut HttpContext) -> BoxFuture<'a, HandlerResult>;
}

/// A pipeline stage that wraps everything after it.
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(&'a self, cx: &'a mut HttpContext, next: Next<'a>) -> BoxFuture<'a, HandlerResult>;
}

/// The remainder of the pipeline after the current layer.
///
/// Consumed by [`Next::run`], so a layer can call downstream at most once.
pub struct Next<'a> {
    endpoint: &'a dyn Endpoint,
    layers: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub fn new(endpoint: &'a dyn Endpoint, layers: &'a [Arc<dyn Middleware>]) -> Self {
        Self { endpoint, layers }
    }

    /// Runs the remaining layers, then the endpoint.
    pub fn run<'b>(self, cx: &'b mut HttpContext) -> BoxFuture<'b, HandlerResult>
    where
        'a: 'b,
    {
        match self.layers.split_first() {
            Some((layer, rest)) => layer.handle(cx, Next { endpoint: self.endpoint, layers: rest }),
            None => self.endpoint.call(cx),
        }
    }
}

/// Adapts a closure into an [`Endpoint`].
///
/// ```rust
/// use wiretap::middleware::endpoint_fn;
/// use wiretap::BoxError;
///
/// let pong = endpoint_fn(|cx| Box::pin(async move {
///     cx.response_mut().write(b"pong").await?;
///     Ok::<_, BoxError>(())
/// }));
/// # let _ = pong;
/// ```
pub fn endpoint_fn<F>(f: F) -> FnEndpoint<F>
where
    F: for<'a> Fn(&'a mut HttpContext) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    FnEndpoint(f)
}

/// Endpoint returned by [`endpoint_fn`].
pub struct FnEndpoint<F>(F);

impl<F> Endpoint for FnEndpoint<F>
where
    F: for<'a> Fn(&'a mut HttpContext) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, cx: &'a mut HttpContext) -> BoxFuture<'a, HandlerResult> {
        (self.0)(cx)
    }
}
