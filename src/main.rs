//! API server entry point: bind one listener, register the bundled routers,
//! serve until the listener set reports completion or an error.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::error;
use tracing_subscriber::EnvFilter;

use observer_api::{Config, HealthRouter, HelloRouter, Server};

const LISTEN_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let listener = match TcpListener::bind(LISTEN_ADDR).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = LISTEN_ADDR, "failed to listen: {e}");
            return;
        }
    };
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!(addr = LISTEN_ADDR, "failed to read listener address: {e}");
            return;
        }
    };

    let mut server = Server::new(Config::default());
    server.accept(addr, listener);
    server.init_routers(vec![
        Box::new(HelloRouter::new()),
        Box::new(HealthRouter::new()),
    ]);

    let server = Arc::new(server);
    let serve = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.serve().await }
    });

    // The outcome goes to stdout either way; the process exits normally.
    match serve.await {
        Ok(Ok(())) => println!("api server stopped"),
        Ok(Err(e)) => println!("api server error: {e}"),
        Err(e) => println!("api server task failed: {e}"),
    }
}
