//! Middleware layer.
//!
//! A middleware takes the next handler in a route's chain and returns a new
//! handler around it. The returned handler decides whether, when, and how
//! many times `next` runs; it may write to the response before and after.
//!
//! Any `Fn(BoxedHandler) -> BoxedHandler` is a middleware. Wrap one with
//! [`from_fn`] to get the [`BoxedMiddleware`] that
//! [`Router::add`](crate::Router::add) takes.
//!
//! Built-in middleware:
//! - [`assert_method`]: answers `405 Method Not Allowed` on a method mismatch
//! - [`log_requests`]: writes one access line per request to a [`LogSink`](crate::log::LogSink)

use std::sync::Arc;

use crate::handler::BoxedHandler;

mod log;
mod method;

pub use self::log::{log_requests, BodyReadError, LogRequests};
pub use self::method::{assert_method, AssertMethod};

/// Wraps a handler with extra behaviour.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

/// A middleware shared between the routes it was added to.
pub type BoxedMiddleware = Arc<dyn Middleware>;

impl<F> Middleware for F
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        (self)(next)
    }
}

/// Boxes a function or closure as a [`BoxedMiddleware`].
pub fn from_fn<F>(f: F) -> BoxedMiddleware
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    Arc::new(f)
}
