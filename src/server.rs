//! Serving a [`ServeMux`] over TCP.
//!
//! Every connection is handed to hyper's auto builder (HTTP/1.1 or HTTP/2)
//! and every request on it is looked up by exact path in the mux. Paths with
//! no route get `404 page not found`.
//!
//! [`Server::serve`] stops on SIGTERM or Ctrl-C; [`Server::serve_with_shutdown`]
//! stops when a caller-supplied future resolves. Either way the listener is
//! dropped first and the call returns once the open connections have
//! finished their requests.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::error::Error;
use crate::mux::ServeMux;
use crate::request::Request;
use crate::response::ResponseWriter;

enum Bind {
    Addr(SocketAddr),
    Listener(TcpListener),
}

/// The HTTP server.
///
/// Serves whatever a [`ServeMux`] holds at request time; build your routers
/// into the mux before calling [`serve`](Server::serve).
pub struct Server {
    bind: Bind,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use chainmux::Server;
    /// assert!(Server::bind("0.0.0.0:3000").is_ok());
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self { bind: Bind::Addr(addr.parse()?) })
    }

    /// Serves on a listener the caller already bound, e.g. to port 0.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { bind: Bind::Listener(listener) }
    }

    /// Starts accepting connections and dispatching them through `mux`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, mux: Arc<ServeMux>) -> Result<(), Error> {
        self.serve_with_shutdown(mux, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `shutdown`
    /// resolves instead of on a process signal.
    pub async fn serve_with_shutdown<F>(self, mux: Arc<ServeMux>, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let listener = match self.bind {
            Bind::Addr(addr) => TcpListener::bind(addr).await?,
            Bind::Listener(listener) => listener,
        };
        let addr = listener.local_addr()?;

        info!(%addr, routes = mux.len(), "chainmux listening");

        // one task per open connection
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // shutdown wins over queued connections
                biased;

                () = &mut shutdown => {
                    info!(open = tasks.len(), "no longer accepting, waiting for open connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!(error = %e, "accept failed");
                            continue;
                        }
                    };

                    let mux = Arc::clone(&mux);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let mux = Arc::clone(&mux);
                            async move { dispatch(mux, req, remote_addr).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, error = %e, "connection failed");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);
        while tasks.join_next().await.is_some() {}

        info!("chainmux stopped");
        Ok(())
    }
}

/// Looks up the exact path and runs its composed handler chain.
///
/// Never fails from hyper's point of view: unknown paths get `404`.
async fn dispatch(
    mux: Arc<ServeMux>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let mut req = Request::from_http(req, Some(remote_addr));
    let mut w = ResponseWriter::new();

    match mux.lookup(req.path()) {
        Some(handler) => handler.serve(&mut req, &mut w).await,
        None => {
            debug!(path = req.path(), "no route");
            w.write_header(StatusCode::NOT_FOUND);
            w.write_str("404 page not found\n");
        }
    }

    Ok(w.into_response())
}

/// Resolves on SIGTERM or Ctrl-C. A signal whose handler cannot be
/// installed is logged and never fires.
async fn shutdown_signal() {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!(signal = "SIGINT", "stopping"),
            Err(e) => {
                error!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!(signal = "SIGTERM", "stopping");
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}
