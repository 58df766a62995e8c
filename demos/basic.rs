//! Minimal chainmux example: two routers, one mux, access logging.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/nomiddleware
//!   curl http://localhost:3000/middleware
//!   curl -X POST http://localhost:3000/orders -d '{"qty":2}'
//!   curl http://localhost:3000/orders          # 405 body, then the handler's
//!
//! Set SYSLOG_ADDR=host:514 to send access lines to a syslog daemon instead
//! of the tracing subscriber.

use std::sync::Arc;

use chainmux::log::{LogSink, Syslog, SyslogConfig, TracingSink};
use chainmux::{
    handler_fn, middleware, token, BoxFuture, BoxedHandler, Request, ResponseWriter, Router,
    ServeMux, Server,
};
use http::header::LOCATION;
use http::HeaderValue;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), chainmux::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let sink: Arc<dyn LogSink> = match std::env::var("SYSLOG_ADDR") {
        Ok(addr) => Arc::new(Syslog::dial(SyslogConfig { addr, ..SyslogConfig::default() }).await?),
        Err(_) => Arc::new(TracingSink),
    };

    let mut pages = Router::new();
    pages.handle_func("/nomiddleware", test_handler);
    pages.add("/middleware", [middleware::from_fn(before_after("A"))]);
    pages.add("/middleware", [middleware::from_fn(before_after("B"))]);
    pages.handle_func("/middleware", test_handler);

    let mut api = Router::new();
    api.add("/orders", [
        middleware::log_requests(Arc::clone(&sink)),
        middleware::assert_method("POST"),
    ]);
    api.handle_func("/orders", create_order);

    let mux = Arc::new(ServeMux::new());
    pages.build(&mux)?;
    api.build(&mux)?;

    Server::bind("0.0.0.0:3000")?.serve(mux).await
}

fn test_handler<'a>(_req: &'a mut Request, w: &'a mut ResponseWriter) -> BoxFuture<'a> {
    Box::pin(async move { w.write_str("Test handler\n") })
}

fn before_after(name: &'static str) -> impl Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static {
    move |next: BoxedHandler| {
        handler_fn(move |req, w| {
            let next = Arc::clone(&next);
            Box::pin(async move {
                w.write_str(&format!("{name}-before\n"));
                next.serve(req, w).await;
                w.write_str(&format!("{name}-after\n"));
            })
        })
    }
}

// POST /orders → 201 with a fresh order id
fn create_order<'a>(_req: &'a mut Request, w: &'a mut ResponseWriter) -> BoxFuture<'a> {
    Box::pin(async move {
        match token::generate(12) {
            Ok(id) => {
                if let Ok(location) = HeaderValue::from_str(&format!("/orders/{id}")) {
                    w.headers_mut().insert(LOCATION, location);
                }
                w.write_header(http::StatusCode::CREATED);
                w.write_str(&format!("{{\"id\":\"{id}\"}}\n"));
            }
            Err(_) => w.write_header(http::StatusCode::INTERNAL_SERVER_ERROR),
        }
    })
}
