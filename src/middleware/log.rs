//! Access logging middleware.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use super::{BoxedMiddleware, Middleware};
use crate::handler::{handler_fn, BoxedHandler};
use crate::log::LogSink;
use crate::request::{BoxError, Request};

/// The request body was announced with a positive `content-length` but
/// could not be read.
#[derive(Debug)]
pub struct BodyReadError {
    line: String,
    source: BoxError,
}

impl BodyReadError {
    /// The access line that was being built when the read failed.
    pub fn line(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for BodyReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot read body: {}", self.line, self.source)
    }
}

impl std::error::Error for BodyReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

/// Writes one line per request to a [`LogSink`] before handing it on.
///
/// The line carries the protocol version, uppercased method, host and
/// request URI, remote address, headers, and declared content length (`-1`
/// when unknown), separated by spaces. When the content length is positive
/// the body is read and appended. The line goes out at debug severity.
///
/// If the body cannot be read, a warning is written instead and the request
/// continues down the chain anyway, unless
/// [`reject_unreadable_body`](LogRequests::reject_unreadable_body) is set.
#[derive(Clone)]
pub struct LogRequests {
    sink: Arc<dyn LogSink>,
    reject_unreadable_body: bool,
}

impl LogRequests {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink, reject_unreadable_body: false }
    }

    /// Answer `400 Bad Request` and stop when the body cannot be read.
    pub fn reject_unreadable_body(mut self) -> Self {
        self.reject_unreadable_body = true;
        self
    }
}

impl Middleware for LogRequests {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        let sink = Arc::clone(&self.sink);
        let reject = self.reject_unreadable_body;
        handler_fn(move |req, w| {
            let next = Arc::clone(&next);
            let sink = Arc::clone(&sink);
            Box::pin(async move {
                if let Err(e) = log_request(req, &*sink).await {
                    if reject {
                        w.write_header(StatusCode::BAD_REQUEST);
                        w.write_str("400 Bad Request");
                        tracing::debug!(error = %e, "request rejected");
                        return;
                    }
                }
                next.serve(req, w).await;
            })
        })
    }
}

/// [`LogRequests`] with default settings, ready for
/// [`Router::add`](crate::Router::add).
pub fn log_requests(sink: Arc<dyn LogSink>) -> BoxedMiddleware {
    Arc::new(LogRequests::new(sink))
}

fn access_line(req: &Request) -> String {
    let remote = req.remote_addr().map(|a| a.to_string()).unwrap_or_default();
    let length = req.content_length().map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
    format!(
        "{:?} {} {}{} {} {:?} {}",
        req.version(),
        req.method().as_str().to_ascii_uppercase(),
        req.host(),
        req.request_uri(),
        remote,
        req.headers(),
        length,
    )
}

async fn log_request(req: &mut Request, sink: &dyn LogSink) -> Result<(), BodyReadError> {
    let mut line = access_line(req);

    if req.content_length().is_some_and(|n| n > 0) {
        match req.read_body().await {
            Ok(body) => {
                line.push(' ');
                line.push_str(&String::from_utf8_lossy(&body));
            }
            Err(source) => {
                let err = BodyReadError { line, source };
                if let Err(e) = sink.warning(&err.to_string()) {
                    tracing::warn!(error = %e, "access log sink write failed");
                }
                return Err(err);
            }
        }
    }

    if let Err(e) = sink.debug(&line) {
        tracing::warn!(error = %e, "access log sink write failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use bytes::Bytes;
    use http::header::{CONTENT_LENGTH, HOST};
    use http::{HeaderValue, Method, Uri};
    use hyper::body::{Body, Frame};

    use super::*;
    use crate::log::testing::MemorySink;
    use crate::log::Severity;
    use crate::ResponseWriter;

    /// A body whose first frame is an error.
    struct BrokenBody;

    impl Body for BrokenBody {
        type Data = Bytes;
        type Error = io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, io::Error>>> {
            Poll::Ready(Some(Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"))))
        }
    }

    /// Refuses every write, like a syslog sink whose queue is full.
    #[derive(Default)]
    struct FailingSink {
        attempts: std::sync::atomic::AtomicUsize,
    }

    impl LogSink for FailingSink {
        fn write(&self, _severity: Severity, _msg: &str) -> io::Result<()> {
            self.attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(io::Error::new(io::ErrorKind::WouldBlock, "queue full"))
        }
    }

    fn echo_body() -> BoxedHandler {
        handler_fn(|req, w| {
            Box::pin(async move {
                match req.read_body().await {
                    Ok(body) => w.write(&body),
                    Err(_) => w.write_str("no body"),
                }
            })
        })
    }

    fn request(body: &'static str) -> Request {
        // extension-method spelling, uppercased in the access line
        Request::new(Method::from_bytes(b"post").unwrap(), Uri::from_static("/orders?id=7"), body)
            .with_header(HOST, HeaderValue::from_static("shop.local"))
            .with_header(CONTENT_LENGTH, HeaderValue::from(body.len()))
            .with_remote_addr("10.0.0.9:5555".parse().unwrap())
    }

    async fn run(mw: LogRequests, mut req: Request) -> ResponseWriter {
        let h = mw.wrap(echo_body());
        let mut w = ResponseWriter::new();
        h.serve(&mut req, &mut w).await;
        w
    }

    #[tokio::test]
    async fn logs_one_debug_line_with_body() {
        let sink = Arc::new(MemorySink::default());
        let w = run(LogRequests::new(sink.clone()), request("{\"qty\":2}")).await;

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        let (severity, line) = &lines[0];
        assert_eq!(*severity, Severity::Debug);
        assert!(line.starts_with("HTTP/1.1 POST shop.local/orders?id=7 10.0.0.9:5555 {"), "{line}");
        assert!(line.ends_with(" 9 {\"qty\":2}"), "{line}");

        // the body is still there for the handler
        assert_eq!(w.body(), b"{\"qty\":2}");
    }

    #[tokio::test]
    async fn unknown_length_is_minus_one_and_body_untouched() {
        let sink = Arc::new(MemorySink::default());
        let req = Request::new(Method::GET, Uri::from_static("/ping"), "");
        run(LogRequests::new(sink.clone()), req).await;

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.starts_with("HTTP/1.1 GET /ping  {}"), "{}", lines[0].1);
        assert!(lines[0].1.ends_with(" -1"), "{}", lines[0].1);
    }

    #[tokio::test]
    async fn unreadable_body_warns_and_continues() {
        let sink = Arc::new(MemorySink::default());
        let mut req = request("xxxx");
        req.set_body(BrokenBody);

        let w = run(LogRequests::new(sink.clone()), req).await;

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Severity::Warning);
        assert!(lines[0].1.contains("cannot read body: peer went away"), "{}", lines[0].1);
        assert_eq!(w.status(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn unreadable_body_can_be_rejected() {
        let sink = Arc::new(MemorySink::default());
        let mut req = request("xxxx");
        req.set_body(BrokenBody);

        let w = run(LogRequests::new(sink.clone()).reject_unreadable_body(), req).await;
        assert_eq!(w.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(w.body(), b"400 Bad Request");
    }

    #[tokio::test]
    async fn readable_body_is_not_rejected() {
        let sink = Arc::new(MemorySink::default());
        let w = run(LogRequests::new(sink).reject_unreadable_body(), request("ok")).await;
        assert_eq!(w.body(), b"ok");
    }

    #[tokio::test]
    async fn failing_sink_does_not_stop_the_chain() {
        let sink = Arc::new(FailingSink::default());
        let w = run(LogRequests::new(sink.clone()), request("{\"qty\":2}")).await;
        assert_eq!(sink.attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(w.status(), Some(StatusCode::OK));
        assert_eq!(w.body(), b"{\"qty\":2}");

        let mut req = request("xxxx");
        req.set_body(BrokenBody);
        let w = run(LogRequests::new(sink.clone()).reject_unreadable_body(), req).await;
        assert_eq!(sink.attempts.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(w.status(), Some(StatusCode::BAD_REQUEST));
    }
}
