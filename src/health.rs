//! Liveness and readiness endpoints.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | Liveness | `/healthz` | Is the process alive? |
//! | Readiness | `/readyz` | Can it serve traffic? |
//!
//! Like every other endpoint these sit under the version prefix, so a probe
//! targets e.g. `/v1.0/healthz`.

use crate::error::ApiError;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Route, Router};

/// Routes for the health probes.
pub struct HealthRouter {
    routes: Vec<Route>,
}

impl HealthRouter {
    pub fn new() -> Self {
        Self {
            routes: vec![
                Route::get("/healthz", liveness),
                Route::get("/readyz", readiness),
            ],
        }
    }
}

impl Default for HealthRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Router for HealthRouter {
    fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// Always `200 OK` with body `ok`. If the process answers HTTP at all, it is
/// alive; this handler intentionally has no dependencies.
async fn liveness(_req: Request) -> Result<Response, ApiError> {
    Ok(Response::text("ok"))
}

/// `200 OK` with body `ready`. Swap in your own router if readiness must gate
/// on dependency health.
async fn readiness(_req: Request) -> Result<Response, ApiError> {
    Ok(Response::text("ready"))
}
