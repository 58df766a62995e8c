//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! A route's terminal handler and every middleware-wrapped layer around it
//! share one shape: an async function that borrows the request and the
//! response writer for the duration of the call. The router and the
//! dispatcher hold handlers of *different* concrete types, so everything is
//! stored behind a trait object:
//!
//! ```text
//! fn hello<'a>(req, w) -> BoxFuture<'a>           ← user writes this
//!        ↓ router.handle_func("/", hello)
//! Arc::new(hello)  as BoxedHandler                ← Handler blanket impl
//!        ↓ middleware m1(m2(handler))             ← Router::build
//! handler.serve(&mut req, &mut w)  per request    ← one vtable dispatch
//! ```
//!
//! The only runtime cost per layer is **one Arc clone** (atomic inc) +
//! **one virtual call**.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::ResponseWriter;

/// A heap-allocated, type-erased future borrowing the request and writer
/// for `'a`.
///
/// `Send` lets tokio move the future across worker threads between polls.
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// A unit of request processing: reads the request, writes the response.
///
/// Implemented for every `Fn(&mut Request, &mut ResponseWriter) -> BoxFuture`,
/// so a plain `fn` item works as a handler:
///
/// ```rust
/// use chainmux::{BoxFuture, Request, ResponseWriter};
///
/// fn hello<'a>(_req: &'a mut Request, w: &'a mut ResponseWriter) -> BoxFuture<'a> {
///     Box::pin(async move { w.write_str("hello\n") })
/// }
/// ```
///
/// For closures use [`handler_fn`], which pins down the higher-ranked
/// signature the compiler cannot infer through a blanket impl.
pub trait Handler: Send + Sync + 'static {
    fn serve<'a>(&'a self, req: &'a mut Request, w: &'a mut ResponseWriter) -> BoxFuture<'a>;
}

/// A type-erased handler shared by every request that reaches its route.
pub type BoxedHandler = Arc<dyn Handler>;

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Request, &'a mut ResponseWriter) -> BoxFuture<'a> + Send + Sync + 'static,
{
    fn serve<'a>(&'a self, req: &'a mut Request, w: &'a mut ResponseWriter) -> BoxFuture<'a> {
        (self)(req, w)
    }
}

/// Boxes a closure as a [`BoxedHandler`].
///
/// ```rust
/// use std::sync::Arc;
/// use chainmux::{handler_fn, BoxedHandler, Handler};
///
/// fn shout(next: BoxedHandler) -> BoxedHandler {
///     handler_fn(move |req, w| {
///         let next = Arc::clone(&next);
///         Box::pin(async move {
///             w.write_str("HEY\n");
///             next.serve(req, w).await;
///         })
///     })
/// }
/// ```
pub fn handler_fn<F>(f: F) -> BoxedHandler
where
    F: for<'a> Fn(&'a mut Request, &'a mut ResponseWriter) -> BoxFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, Uri};

    fn named<'a>(req: &'a mut Request, w: &'a mut ResponseWriter) -> BoxFuture<'a> {
        Box::pin(async move { w.write_str(req.path()) })
    }

    #[tokio::test]
    async fn fn_items_are_handlers() {
        let h: BoxedHandler = Arc::new(named);
        let mut req = Request::new(Method::GET, Uri::from_static("/named"), "");
        let mut w = ResponseWriter::new();
        h.serve(&mut req, &mut w).await;
        assert_eq!(w.body(), b"/named");
    }

    #[tokio::test]
    async fn closures_capture_state() {
        let greeting = String::from("hi ");
        let h = handler_fn(move |req, w| {
            let line = format!("{greeting}{}", req.method());
            Box::pin(async move { w.write_str(&line) })
        });
        let mut req = Request::new(Method::PUT, Uri::from_static("/"), "");
        let mut w = ResponseWriter::new();
        h.serve(&mut req, &mut w).await;
        assert_eq!(w.body(), b"hi PUT");
    }
}
