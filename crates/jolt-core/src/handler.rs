//! Handler trait for request processing.
//!
//! The [`Handler`] trait defines the interface for route handlers. A
//! handler receives the mutable [`Exchange`] and either commits the
//! response itself (redirect, `json`, `text`, ...) or returns an
//! [`Outcome`] that the invocation pipeline step coerces into a response
//! body: strings become `text/plain`, JSON values become
//! `application/json`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;
use serde_json::Value;

use crate::error::JoltResult;
use crate::exchange::Exchange;

/// A boxed future, used for trait-object handler dispatch.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Return value of a handler, coerced to a response by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Plain-text body.
    Text(String),
    /// HTML body.
    Html(String),
    /// JSON body.
    Json(Value),
    /// Empty body with an explicit status.
    Status(StatusCode),
    /// The handler committed the response itself; nothing to coerce.
    Done,
}

/// A route handler.
///
/// # Example
///
/// ```
/// use jolt_core::{Exchange, Handler, JoltResult, Outcome, BoxFuture};
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn call<'a>(&'a self, _ex: &'a mut Exchange) -> BoxFuture<'a, JoltResult<Outcome>> {
///         Box::pin(async { Ok(Outcome::Text("hello".to_string())) })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles a request.
    fn call<'a>(&'a self, ex: &'a mut Exchange) -> BoxFuture<'a, JoltResult<Outcome>>;
}

/// A handler built from a synchronous closure.
///
/// Useful for thin controllers and tests; handlers that need to await
/// implement [`Handler`] directly.
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&mut Exchange) -> JoltResult<Outcome> + Send + Sync + 'static,
{
    /// Wraps a synchronous closure as a handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut Exchange) -> JoltResult<Outcome> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ex: &'a mut Exchange) -> BoxFuture<'a, JoltResult<Outcome>> {
        let result = (self.func)(ex);
        Box::pin(async move { result })
    }
}

/// The type-erased handler reference stored in the route registry.
pub type RouteHandler = Arc<dyn Handler>;

/// Convenience constructor for a boxed synchronous handler.
pub fn handler_fn<F>(func: F) -> RouteHandler
where
    F: Fn(&mut Exchange) -> JoltResult<Outcome> + Send + Sync + 'static,
{
    Arc::new(FnHandler::new(func))
}
