//! Per-route middleware chains.
//!
//! A [`Router`] collects, for each route, an ordered list of middleware and
//! one terminal handler. [`Router::build`] folds each list around its handler
//! and installs the result into a [`Dispatcher`]. Build it once at startup.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler};
use crate::middleware::BoxedMiddleware;
use crate::mux::{Dispatcher, ServeMux};
use crate::request::Request;
use crate::response::ResponseWriter;

#[derive(Default)]
struct Route {
    middleware: Vec<BoxedMiddleware>,
    handler: Option<BoxedHandler>,
}

impl Route {
    /// `m1(m2(...mk(h)))`: the first-registered middleware runs outermost.
    fn compose(self, path: &str) -> Result<BoxedHandler, Error> {
        let handler = self.handler.ok_or_else(|| Error::MissingHandler { route: path.to_owned() })?;
        Ok(self.middleware.iter().rev().fold(handler, |next, mw| mw.wrap(next)))
    }
}

/// Route table under construction.
///
/// Routes are kept in the order they were first mentioned; `build` walks
/// them in that order.
///
/// ```rust
/// use chainmux::{middleware, BoxFuture, Request, ResponseWriter, Router, ServeMux};
///
/// fn hello<'a>(_req: &'a mut Request, w: &'a mut ResponseWriter) -> BoxFuture<'a> {
///     Box::pin(async move { w.write_str("hello\n") })
/// }
///
/// let mut router = Router::new();
/// router.add("/hello", [middleware::assert_method("GET")]);
/// router.handle_func("/hello", hello);
///
/// let mux = ServeMux::new();
/// router.build(&mux).unwrap();
/// assert!(mux.contains("/hello"));
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<(String, Route)>,
    index: HashMap<String, usize>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, path: &str) -> &mut Route {
        let i = match self.index.get(path) {
            Some(&i) => i,
            None => {
                self.routes.push((path.to_owned(), Route::default()));
                self.index.insert(path.to_owned(), self.routes.len() - 1);
                self.routes.len() - 1
            }
        };
        &mut self.routes[i].1
    }

    /// Appends middleware to `path`, in iteration order. Repeated calls
    /// accumulate; nothing is ever replaced.
    pub fn add<I>(&mut self, path: &str, middleware: I)
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        self.entry(path).middleware.extend(middleware);
    }

    /// Sets the terminal handler for `path`, replacing any earlier one.
    pub fn handle(&mut self, path: &str, handler: BoxedHandler) {
        self.entry(path).handler = Some(handler);
    }

    /// [`handle`](Router::handle) for a function or closure.
    pub fn handle_func<F>(&mut self, path: &str, f: F)
    where
        F: for<'a> Fn(&'a mut Request, &'a mut ResponseWriter) -> BoxFuture<'a> + Send + Sync + 'static,
    {
        self.handle(path, crate::handler::handler_fn(f));
    }

    /// Routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|(path, _)| path.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Composes every route and installs it into `dispatcher`.
    ///
    /// Stops at the first route without a handler and returns
    /// [`Error::MissingHandler`]. Routes processed before it stay installed.
    pub fn build<D>(self, dispatcher: &D) -> Result<(), Error>
    where
        D: Dispatcher + ?Sized,
    {
        for (path, route) in self.routes {
            let layers = route.middleware.len();
            let handler = route.compose(&path)?;
            dispatcher.register_route(&path, handler);
            debug!(route = %path, layers, "route installed");
        }
        Ok(())
    }

    /// [`build`](Router::build) into the process-wide [`ServeMux::shared`].
    pub fn build_shared(self) -> Result<(), Error> {
        self.build(&*ServeMux::shared())
    }
}
