//! Request-method guard.

use std::sync::Arc;

use http::StatusCode;

use super::{BoxedMiddleware, Middleware};
use crate::handler::{handler_fn, BoxedHandler};

/// Writes `405 Method Not Allowed` when the request method differs from the
/// expected one (compared case-insensitively).
///
/// By default the guard still calls the next handler after writing the 405,
/// so whatever the rest of the chain writes is appended to the same
/// response. Existing deployments rely on this. Call [`AssertMethod::strict`]
/// to stop the chain on a mismatch instead.
#[derive(Clone, Debug)]
pub struct AssertMethod {
    method: Arc<str>,
    strict: bool,
}

impl AssertMethod {
    pub fn new(method: &str) -> Self {
        Self { method: Arc::from(method), strict: false }
    }

    /// Do not call the next handler after answering 405.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

impl Middleware for AssertMethod {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        let method = Arc::clone(&self.method);
        let strict = self.strict;
        handler_fn(move |req, w| {
            let next = Arc::clone(&next);
            let allowed = req.method().as_str().eq_ignore_ascii_case(&method);
            Box::pin(async move {
                if !allowed {
                    w.write_header(StatusCode::METHOD_NOT_ALLOWED);
                    w.write_str("405 Method Not Allowed");
                    if strict {
                        return;
                    }
                }
                next.serve(req, w).await;
            })
        })
    }
}

/// [`AssertMethod`] in its compatible (non-stopping) mode, ready for
/// [`Router::add`](crate::Router::add).
pub fn assert_method(method: &str) -> BoxedMiddleware {
    Arc::new(AssertMethod::new(method))
}

#[cfg(test)]
mod tests {
    use http::{Method, Uri};

    use super::*;
    use crate::{Request, ResponseWriter};

    fn terminal() -> BoxedHandler {
        handler_fn(|_req, w| Box::pin(async move { w.write_str("Test handler\n") }))
    }

    async fn run(guard: &dyn Middleware, method: Method) -> ResponseWriter {
        let h = guard.wrap(terminal());
        let mut req = Request::new(method, Uri::from_static("/guarded"), "");
        let mut w = ResponseWriter::new();
        h.serve(&mut req, &mut w).await;
        w
    }

    #[tokio::test]
    async fn matching_method_passes_through() {
        let w = run(&AssertMethod::new("POST"), Method::POST).await;
        assert_eq!(w.status(), Some(StatusCode::OK));
        assert_eq!(w.body(), b"Test handler\n");
    }

    #[tokio::test]
    async fn comparison_ignores_case() {
        let w = run(&AssertMethod::new("post"), Method::POST).await;
        assert_eq!(w.body(), b"Test handler\n");
    }

    #[tokio::test]
    async fn mismatch_writes_405_and_still_continues() {
        let w = run(&AssertMethod::new("POST"), Method::GET).await;
        assert_eq!(w.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
        assert_eq!(w.body(), b"405 Method Not AllowedTest handler\n");
    }

    #[tokio::test]
    async fn strict_mismatch_stops_the_chain() {
        let w = run(&AssertMethod::new("POST").strict(), Method::GET).await;
        assert_eq!(w.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
        assert_eq!(w.body(), b"405 Method Not Allowed");
    }
}
