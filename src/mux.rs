//! Exact-path dispatch table.
//!
//! The [`Dispatcher`] trait is the seam [`Router::build`](crate::Router::build)
//! installs composed handlers through. [`ServeMux`] is the implementation the
//! bundled [`Server`](crate::Server) reads from: one handler per exact path,
//! no patterns, no wildcards.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::handler::BoxedHandler;

/// Anything a router can install route handlers into.
pub trait Dispatcher {
    /// Installs `handler` under `route`, replacing any previous handler.
    fn register_route(&self, route: &str, handler: BoxedHandler);
}

impl<D: Dispatcher + ?Sized> Dispatcher for Arc<D> {
    fn register_route(&self, route: &str, handler: BoxedHandler) {
        (**self).register_route(route, handler)
    }
}

/// A thread-safe map from exact request path to handler.
///
/// Registration takes a write lock; lookups on the hot path take a read lock
/// and clone one `Arc`.
#[derive(Default)]
pub struct ServeMux {
    routes: RwLock<HashMap<String, BoxedHandler>>,
}

static SHARED: OnceLock<Arc<ServeMux>> = OnceLock::new();

impl ServeMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide mux.
    ///
    /// Created on first use and never dropped. Every caller gets the same
    /// table, so two routers registering the same path into it collide and
    /// the later registration wins silently.
    pub fn shared() -> Arc<ServeMux> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(ServeMux::new())))
    }

    pub fn lookup(&self, path: &str) -> Option<BoxedHandler> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        routes.get(path).map(Arc::clone)
    }

    pub fn contains(&self, path: &str) -> bool {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        routes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.routes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Dispatcher for ServeMux {
    fn register_route(&self, route: &str, handler: BoxedHandler) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        if routes.insert(route.to_owned(), handler).is_some() {
            debug!(route, "replaced existing route");
        }
    }
}
