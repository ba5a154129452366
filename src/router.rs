//! Route declaration: the immutable (method, path, handler) triple and the
//! [`Router`] trait feature modules implement.
//!
//! Declaring a route does not make it reachable. The server queries each
//! registered router once at serve time and builds the dispatch table from
//! whatever [`Router::routes`] returns.

use http::Method;

use crate::handler::{BoxedHandler, Handler};

/// A single API route.
///
/// Immutable after construction; identity is structural (method + path).
/// Paths use `matchit` syntax, so `/users/{id}` declares a path variable
/// retrievable through [`Request::var`](crate::Request::var).
pub struct Route {
    method: Method,
    path: String,
    handler: BoxedHandler,
}

impl Route {
    /// Declares a route for an arbitrary method. Registration cannot fail;
    /// collisions are resolved (and logged) when the dispatch table is built.
    pub fn new(method: Method, path: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            method,
            path: path.into(),
            handler: handler.into_boxed_handler(),
        }
    }

    pub fn get(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::GET, path, handler)
    }

    pub fn post(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::POST, path, handler)
    }

    pub fn put(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PUT, path, handler)
    }

    pub fn delete(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::DELETE, path, handler)
    }

    pub fn head(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::HEAD, path, handler)
    }

    pub fn options(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::OPTIONS, path, handler)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn handler(&self) -> BoxedHandler {
        BoxedHandler::clone(&self.handler)
    }
}

/// A named source of routes.
///
/// Implement this on a feature module's type and hand it to
/// [`Server::init_routers`](crate::Server::init_routers); the server wires the
/// routes up without knowing the module exists at compile time.
pub trait Router {
    /// The routes this module exposes, queried once during server setup.
    fn routes(&self) -> &[Route];
}
