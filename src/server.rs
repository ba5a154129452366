//! The API server wrapper: listener ownership, router aggregation, dispatch.
//!
//! A [`Server`] does not bind sockets. Callers bind their own
//! [`TcpListener`]s and attach them with [`Server::accept`]; the server only
//! owns their serving lifecycle. At [`Server::serve`] time the routes of every
//! registered [`Router`] are folded into one dispatch table, one accept-loop
//! task is started per listener, and the call resolves with the first error
//! any loop reports (or `Ok` once all of them exit).
//!
//! Routes are exposed under a version prefix: a route declared as `/hello` is
//! reachable at `/v1.0/hello` (any non-empty run of ASCII digits and dots is
//! accepted as the version). The captured version is handed to handlers as
//! the `version` path variable and is not otherwise interpreted.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use matchit::Router as MatchitRouter;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Route, Router};

// ── Configuration ─────────────────────────────────────────────────────────────

/// API server configuration.
///
/// `tls` and `hosts` are accepted and stored but not consumed anywhere in the
/// serving path yet; listeners arrive already bound, in plaintext.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub tls: Option<TlsConfig>,
    pub hosts: Vec<String>,
}

/// TLS material locations for a TLS-terminating listener.
#[derive(Clone, Debug, Default)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

// ── Server ────────────────────────────────────────────────────────────────────

/// The API server.
///
/// Setup (`accept`, `init_routers`) is single-threaded and finishes before
/// [`serve`](Server::serve) runs; nothing here is mutated while serving, so
/// the server can sit behind an `Arc` and be closed from another task.
pub struct Server {
    cfg: Config,
    servers: Vec<Arc<HttpServer>>,
    routers: Vec<Box<dyn Router + Send + Sync>>,
    shutdown: watch::Sender<bool>,
}

impl Server {
    /// Returns a new server instance for the given configuration.
    pub fn new(cfg: Config) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            cfg,
            servers: Vec::new(),
            routers: Vec::new(),
            shutdown,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Attaches an externally bound listener to the managed set. Serving does
    /// not start until [`serve`](Server::serve).
    pub fn accept(&mut self, addr: SocketAddr, listener: TcpListener) {
        self.servers.push(Arc::new(HttpServer { addr, listener }));
    }

    /// Appends routers to the set aggregated into the dispatch table. No
    /// duplicate detection happens here; collisions surface when the table is
    /// built.
    pub fn init_routers(&mut self, routers: Vec<Box<dyn Router + Send + Sync>>) {
        self.routers.extend(routers);
    }

    /// Builds the dispatch table and serves every attached listener until all
    /// accept loops exit.
    ///
    /// Returns the first error any loop reports. One failing listener does
    /// not cancel the others; their results are still collected in arrival
    /// order by later callers of this method's completion channel, but only
    /// the first failure is returned.
    pub async fn serve(&self) -> Result<(), Error> {
        let dispatch = Arc::new(self.build_dispatch());

        // Sized to the listener count so every accept loop can report without
        // blocking, even after serve has already returned an earlier error.
        // The channel constructor rejects zero capacity, hence the floor.
        let (tx, mut rx) = mpsc::channel(self.servers.len().max(1));

        for srv in &self.servers {
            let srv = Arc::clone(srv);
            let dispatch = Arc::clone(&dispatch);
            let tx = tx.clone();
            let mut shutdown = self.shutdown.subscribe();
            tokio::spawn(async move {
                let result = srv.serve(dispatch, &mut shutdown).await;
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        for _ in 0..self.servers.len() {
            match rx.recv().await {
                Some(Ok(())) | None => {}
                Some(Err(e)) => {
                    error!("serve error: {e}");
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Stops every managed listener.
    ///
    /// Accept loops observe the shutdown flag and exit cleanly, so a close is
    /// never reported as a serve error. In-flight connections are not
    /// interrupted.
    pub fn close(&self) {
        info!("closing api server listeners");
        self.shutdown.send_replace(true);
    }

    fn build_dispatch(&self) -> Dispatch {
        let mut dispatch = Dispatch::default();
        info!("registering routes");
        for router in &self.routers {
            for route in router.routes() {
                info!(method = %route.method(), path = %route.path(), "registering route");
                dispatch.add(route);
            }
        }
        dispatch
    }
}

// ── Per-listener serving ──────────────────────────────────────────────────────

/// One managed listener and the address it was attached under.
struct HttpServer {
    addr: SocketAddr,
    listener: TcpListener,
}

impl HttpServer {
    /// Runs this listener's accept loop until shutdown or a socket failure.
    async fn serve(
        &self,
        dispatch: Arc<Dispatch>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), Error> {
        if *shutdown.borrow() {
            return Ok(());
        }

        info!(addr = %self.addr, "api listening");

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom, so a close stops the
                // accept loop even when connections are queued.
                biased;

                changed = shutdown.changed() => {
                    // The flag only ever flips to true; a send-side drop means
                    // the server itself is gone. Either way this listener is
                    // done, and done is not an error.
                    let _ = changed;
                    info!(addr = %self.addr, "listener closed");
                    return Ok(());
                }

                res = self.listener.accept() => {
                    match res {
                        Ok((stream, remote_addr)) => {
                            self.spawn_connection(stream, remote_addr, &dispatch);
                        }
                        Err(e) => {
                            return Err(Error::Accept { addr: self.addr, source: e });
                        }
                    }
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, remote_addr: SocketAddr, dispatch: &Arc<Dispatch>) {
        let dispatch = Arc::clone(dispatch);
        // TokioIo adapts tokio's AsyncRead/AsyncWrite to the hyper IO traits.
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            // `service_fn` is called once per request on the connection, not
            // once per connection.
            let svc = service_fn(move |req| {
                let dispatch = Arc::clone(&dispatch);
                async move { handle_request(dispatch, req).await }
            });

            // The auto builder handles both HTTP/1.1 and HTTP/2, whichever
            // the client negotiates.
            if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                .serve_connection(io, svc)
                .await
            {
                error!(peer = %remote_addr, "connection error: {e}");
            }
        });
    }
}

// ── Dispatch table ────────────────────────────────────────────────────────────

/// The dispatch table built once per [`Server::serve`] call: one radix tree
/// per HTTP method, keyed by the declared route paths.
#[derive(Default)]
struct Dispatch {
    trees: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Dispatch {
    fn add(&mut self, route: &Route) {
        let tree = self.trees.entry(route.method().clone()).or_default();
        if let Err(e) = tree.insert(route.path().to_owned(), route.handler()) {
            warn!(
                method = %route.method(),
                path = %route.path(),
                "route collision, keeping first registration: {e}"
            );
        }
    }

    /// Resolves a request path of the form `/v<version><route-path>` to a
    /// handler plus the extracted path variables (always including `version`).
    fn lookup(&self, method: &Method, path: &str) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let (version, rest) = split_version(path)?;
        let tree = self.trees.get(method)?;
        let matched = tree.at(rest).ok()?;

        let mut vars: HashMap<String, String> = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        vars.insert("version".to_owned(), version.to_owned());

        Some((BoxedHandler::clone(matched.value), vars))
    }
}

/// Splits `/v1.0/hello` into `("1.0", "/hello")`.
///
/// The version must be a non-empty run of ASCII digits and dots; anything
/// else means the path is outside the versioned API surface.
fn split_version(path: &str) -> Option<(&str, &str)> {
    let tail = path.strip_prefix("/v")?;
    let end = tail.find('/').unwrap_or(tail.len());
    let version = &tail[..end];
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    Some((version, &tail[end..]))
}

// ── Request adapter ───────────────────────────────────────────────────────────

/// Routes one request and produces one response.
///
/// The error type is [`Infallible`]: lookup misses become 404, body failures
/// become 400, and handler errors are mapped through
/// [`ApiError`](crate::ApiError), so hyper never sees a failure.
async fn handle_request(
    dispatch: Arc<Dispatch>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_owned();

    let Some((handler, vars)) = dispatch.lookup(&parts.method, parts.uri.path()) else {
        debug!(%method, %path, "no route");
        return Ok(Response::status(StatusCode::NOT_FOUND).into_http());
    };

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(%method, %path, "failed to read request body: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_http());
        }
    };

    let response = match handler.call(Request::new(parts, body, vars)).await {
        Ok(response) => response,
        Err(e) => {
            if e.status().is_server_error() {
                error!(%method, %path, "handler error: {e}");
            }
            e.into_response()
        }
    };

    Ok(response.into_http())
}
