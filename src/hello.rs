//! The hello endpoint, the smallest possible [`Router`] implementation.

use crate::error::ApiError;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Route, Router};

/// Routes for the hello endpoint.
pub struct HelloRouter {
    routes: Vec<Route>,
}

impl HelloRouter {
    pub fn new() -> Self {
        Self {
            routes: vec![Route::post("/hello", post_hello)],
        }
    }
}

impl Default for HelloRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Router for HelloRouter {
    fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// `POST /hello`: ignores body and variables, always answers `welcome`.
async fn post_hello(_req: Request) -> Result<Response, ApiError> {
    Ok(Response::text("welcome"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn declares_exactly_one_post_route() {
        let router = HelloRouter::new();
        let routes = router.routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].method(), Method::POST);
        assert_eq!(routes[0].path(), "/hello");
    }
}
