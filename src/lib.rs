//! # observer-api
//!
//! A pluggable HTTP API server scaffold. Feature modules declare their
//! endpoints as [`Router`]s; the [`Server`] aggregates them into one dispatch
//! table and serves any number of externally bound listeners.
//!
//! ## The contract
//!
//! - A route is an immutable (method, path, handler) triple. Routers are
//!   queried once, at serve time; nothing mutates after setup.
//! - Listeners are bound by the caller and only *managed* here. One accept
//!   loop runs per listener; [`Server::serve`] resolves with the first error
//!   any of them reports, and [`Server::close`] shuts all of them down
//!   cleanly.
//! - Every route is exposed under a version prefix: declaring `/hello` makes
//!   it reachable at `/v1.0/hello` (any numeric dotted version matches, and
//!   handlers see it as the `version` path variable).
//! - Handlers return `Result<Response, ApiError>`; errors map to determinate
//!   status + body responses, never to a dropped request.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use observer_api::{Config, HelloRouter, Server};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let addr = listener.local_addr().unwrap();
//!
//!     let mut server = Server::new(Config::default());
//!     server.accept(addr, listener);
//!     server.init_routers(vec![Box::new(HelloRouter::new())]);
//!
//!     // POST /v1.0/hello now answers "welcome".
//!     Arc::new(server).serve().await.unwrap();
//! }
//! ```

mod error;
mod handler;
mod health;
mod hello;
mod request;
mod response;
mod router;
mod server;

pub use error::{ApiError, Error};
pub use handler::Handler;
pub use health::HealthRouter;
pub use hello::HelloRouter;
pub use request::Request;
pub use response::{Response, ResponseBuilder};
pub use router::{Route, Router};
pub use server::{Config, Server, TlsConfig};
