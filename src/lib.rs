//! # chainmux
//!
//! Per-route middleware chains for a minimal hyper server.
//!
//! ## The contract
//!
//! You describe each route as an ordered list of middleware plus one
//! terminal handler. [`Router::build`] folds every list around its handler,
//! first-registered middleware outermost, and installs the result into a
//! [`Dispatcher`] exactly once. That is the whole job.
//!
//! What the reverse proxy in front of you already owns, chainmux ignores:
//!
//! - **Pattern routing**: paths are matched exactly
//! - **TLS termination**
//! - **Content negotiation**
//! - **Connection pooling**
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chainmux::log::TracingSink;
//! use chainmux::{middleware, BoxFuture, Request, ResponseWriter, Router, ServeMux, Server};
//!
//! fn hello<'a>(_req: &'a mut Request, w: &'a mut ResponseWriter) -> BoxFuture<'a> {
//!     Box::pin(async move { w.write_str("hello\n") })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chainmux::Error> {
//!     let mut router = Router::new();
//!     router.add("/hello", [
//!         middleware::log_requests(Arc::new(TracingSink)),
//!         middleware::assert_method("GET"),
//!     ]);
//!     router.handle_func("/hello", hello);
//!
//!     let mux = Arc::new(ServeMux::new());
//!     router.build(&mux)?;
//!
//!     Server::bind("0.0.0.0:3000")?.serve(mux).await
//! }
//! ```

mod error;
mod handler;
mod mux;
mod request;
mod response;
mod router;
mod server;

pub mod log;
pub mod middleware;
pub mod token;

pub use error::Error;
pub use handler::{handler_fn, BoxFuture, BoxedHandler, Handler};
pub use middleware::{BoxedMiddleware, Middleware};
pub use mux::{Dispatcher, ServeMux};
pub use request::{BoxError, Request};
pub use response::ResponseWriter;
pub use router::Router;
pub use server::Server;
