//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::Method;
use http::request::Parts;

/// An incoming HTTP request, handed to a route handler after dispatch.
///
/// The body is fully collected before the handler runs, and path variables
/// (including the API `version` prefix) are already extracted into a
/// string-keyed map.
pub struct Request {
    parts: Parts,
    body: Bytes,
    vars: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(parts: Parts, body: Bytes, vars: HashMap<String, String>) -> Self {
        Self { parts, body, vars }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Case-insensitive header lookup. Non-UTF-8 header values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path variable.
    ///
    /// For a route `/users/{id}`, `req.var("id")` on `/v1.0/users/42` returns
    /// `Some("42")`. The version prefix is available as `req.var("version")`.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// All path variables extracted for this request.
    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }
}
