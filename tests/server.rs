// tests/server.rs
//
// End-to-end tests: start a server on an ephemeral port, speak HTTP/1.1 over
// a raw TcpStream, assert on status and body.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use observer_api::{
    ApiError, Config, Error, HealthRouter, HelloRouter, Request, Response, Route, Router, Server,
};

#[tokio::test]
async fn post_hello_returns_welcome() {
    let (addr, server, handle) = start_server(vec![Box::new(HelloRouter::new())]).await;

    let (status, body) = http_request(addr, "POST", "/v1.0/hello", "any body at all").await;
    assert_eq!(status, 200);
    assert_eq!(body, "welcome");

    server.close();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn any_numeric_dotted_version_matches() {
    let (addr, server, handle) = start_server(vec![Box::new(HelloRouter::new())]).await;

    for path in ["/v1.0/hello", "/v2/hello", "/v10.2.33/hello"] {
        let (status, body) = http_request(addr, "POST", path, "").await;
        assert_eq!(status, 200, "path {path}");
        assert_eq!(body, "welcome");
    }

    server.close();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn declared_route_is_unreachable_with_other_methods() {
    let (addr, server, handle) = start_server(vec![Box::new(HelloRouter::new())]).await;

    for method in ["GET", "PUT", "DELETE"] {
        let (status, _) = http_request(addr, method, "/v1.0/hello", "").await;
        assert_eq!(status, 404, "method {method}");
    }

    server.close();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn paths_outside_the_version_prefix_are_not_routed() {
    let (addr, server, handle) = start_server(vec![Box::new(HelloRouter::new())]).await;

    for path in ["/hello", "/v/hello", "/vbeta/hello", "/v1.0beta/hello", "/v1.0/goodbye"] {
        let (status, _) = http_request(addr, "POST", path, "").await;
        assert_eq!(status, 404, "path {path}");
    }

    server.close();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn path_vars_and_version_reach_the_handler() {
    let (addr, server, handle) = start_server(vec![Box::new(ProjectRouter::new())]).await;

    let (status, body) = http_request(addr, "GET", "/v1.2/projects/atlas", "").await;
    assert_eq!(status, 200);
    assert_eq!(body, "atlas@1.2");

    server.close();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn handler_errors_map_to_status_and_body() {
    let (addr, server, handle) = start_server(vec![Box::new(ProjectRouter::new())]).await;

    let (status, body) = http_request(addr, "POST", "/v1.0/projects", "").await;
    assert_eq!(status, 400);
    assert_eq!(body, "invalid request: name required");

    server.close();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn health_probes_answer_under_the_version_prefix() {
    let (addr, server, handle) = start_server(vec![Box::new(HealthRouter::new())]).await;

    let (status, body) = http_request(addr, "GET", "/v1.0/healthz", "").await;
    assert_eq!((status, body.as_str()), (200, "ok"));
    let (status, body) = http_request(addr, "GET", "/v1.0/readyz", "").await;
    assert_eq!((status, body.as_str()), (200, "ready"));

    server.close();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn close_terminates_serve_without_error() {
    let (addr, server, handle) = start_server(vec![Box::new(HelloRouter::new())]).await;

    // Serve at least one request so the accept loop is demonstrably running
    // before the close lands.
    let (status, _) = http_request(addr, "POST", "/v1.0/hello", "").await;
    assert_eq!(status, 200);

    server.close();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn zero_routers_still_produces_a_functioning_server() {
    let (addr, server, handle) = start_server(Vec::new()).await;

    let (status, _) = http_request(addr, "GET", "/v1.0/anything", "").await;
    assert_eq!(status, 404);

    server.close();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn every_attached_listener_serves_the_same_routes() {
    let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let second = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let first_addr = first.local_addr().unwrap();
    let second_addr = second.local_addr().unwrap();

    let mut server = Server::new(Config::default());
    server.accept(first_addr, first);
    server.accept(second_addr, second);
    server.init_routers(vec![Box::new(HelloRouter::new())]);

    let server = Arc::new(server);
    let handle = spawn_serve(&server);

    for addr in [first_addr, second_addr] {
        let (status, body) = http_request(addr, "POST", "/v1.0/hello", "").await;
        assert_eq!(status, 200, "listener {addr}");
        assert_eq!(body, "welcome");
    }

    server.close();
    assert!(handle.await.unwrap().is_ok());
}

// ---------------------------------------------------------------------
// UTILS
// ---------------------------------------------------------------------

/// A second feature router, with a path variable and a failing handler.
struct ProjectRouter {
    routes: Vec<Route>,
}

impl ProjectRouter {
    fn new() -> Self {
        Self {
            routes: vec![
                Route::get("/projects/{name}", get_project),
                Route::post("/projects", reject_project),
            ],
        }
    }
}

impl Router for ProjectRouter {
    fn routes(&self) -> &[Route] {
        &self.routes
    }
}

async fn get_project(req: Request) -> Result<Response, ApiError> {
    let name = req.var("name").unwrap_or("?").to_owned();
    let version = req.var("version").unwrap_or("?").to_owned();
    Ok(Response::text(format!("{name}@{version}")))
}

async fn reject_project(_req: Request) -> Result<Response, ApiError> {
    Err(ApiError::InvalidRequest("name required".into()))
}

async fn start_server(
    routers: Vec<Box<dyn Router + Send + Sync>>,
) -> (SocketAddr, Arc<Server>, JoinHandle<Result<(), Error>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut server = Server::new(Config::default());
    server.accept(addr, listener);
    server.init_routers(routers);

    let server = Arc::new(server);
    let handle = spawn_serve(&server);
    // The listener is already bound, so connections queue in the kernel even
    // before the accept loop's first poll; no startup sleep needed.
    (addr, server, handle)
}

fn spawn_serve(server: &Arc<Server>) -> JoinHandle<Result<(), Error>> {
    let server = Arc::clone(server);
    tokio::spawn(async move { server.serve().await })
}

/// One-shot HTTP/1.1 exchange over a raw TCP stream. Returns (status, body).
async fn http_request(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {path} HTTP/1.1\r\nhost: localhost\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw);

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("malformed response: {text}"));
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_owned())
        .unwrap_or_default();
    (status, body)
}
