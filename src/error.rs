//! Error types for the serving path and for request handlers.

use std::fmt;
use std::net::SocketAddr;

use http::StatusCode;

use crate::response::Response;

// ── Error ─────────────────────────────────────────────────────────────────────

/// The error type returned by [`Server::serve`](crate::Server::serve).
///
/// Application-level failures (bad input, missing resources) are expressed as
/// [`ApiError`] values inside handlers, not as `Error`s. This type surfaces
/// infrastructure failures only. A listener shut down through
/// [`Server::close`](crate::Server::close) is not a failure and never produces
/// an `Error`.
#[derive(Debug)]
pub enum Error {
    /// A listener's accept loop failed at the socket level.
    Accept {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept { addr, source } => write!(f, "accept on {addr}: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Accept { source, .. } => Some(source),
        }
    }
}

// ── ApiError ──────────────────────────────────────────────────────────────────

/// A request-level failure returned by a route handler.
///
/// Every variant maps to a fixed status code, and the dispatch adapter turns
/// any `Err(ApiError)` into a plain-text response with that status. A handler
/// can fail without ever leaving the client with an indeterminate response.
#[derive(Debug)]
pub enum ApiError {
    /// The request was understood but malformed. Maps to `400 Bad Request`.
    InvalidRequest(String),
    /// The addressed resource does not exist. Maps to `404 Not Found`.
    NotFound(String),
    /// An internal failure the client cannot act on. Maps to `500`.
    Internal(String),
}

impl ApiError {
    /// The status code this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn into_response(self) -> Response {
        let status = self.status();
        Response::builder().status(status).text(self.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_maps_to_fixed_status() {
        assert_eq!(
            ApiError::InvalidRequest("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("gone".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn io_errors_become_internal() {
        let e: ApiError = std::io::Error::other("disk full").into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
