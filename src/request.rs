//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::{HeaderMap, Method};
use http_body_util::BodyExt;

use crate::body::{self, Body};
use crate::error::BoxError;

/// An incoming HTTP request.
///
/// The body is a stream and is not read until a handler (or a middleware)
/// asks for it.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Body,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// Builds a request from an [`http::Request`] whose body is already a [`Body`].
    ///
    /// ```rust
    /// use wiretap::{body, Request};
    ///
    /// let req = Request::from_http(
    ///     http::Request::builder()
    ///         .method("POST")
    ///         .uri("/ping")
    ///         .header("content-length", "4")
    ///         .body(body::full("ping"))
    ///         .unwrap(),
    /// );
    /// assert_eq!(req.path(), "/ping");
    /// ```
    pub fn from_http(req: http::Request<Body>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            headers: parts.headers,
            body,
            params: HashMap::new(),
        }
    }

    pub(crate) fn from_hyper(req: hyper::Request<hyper::body::Incoming>) -> Self {
        Self::from_http(req.map(|incoming| {
            incoming.map_err(|e| -> BoxError { Box::new(e) }).boxed()
        }))
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Case-insensitive header lookup. Values that are not visible ASCII are
    /// reported as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The declared `content-length`, if present and well-formed.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Swaps in a new body and returns the old one.
    pub fn replace_body(&mut self, body: Body) -> Body {
        std::mem::replace(&mut self.body, body)
    }

    /// Reads the whole body.
    pub async fn bytes(self) -> Result<Bytes, BoxError> {
        Ok(self.body.collect().await?.to_bytes())
    }

    /// Reads the whole body as UTF-8 text. Invalid sequences are replaced.
    pub async fn text(self) -> Result<String, BoxError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Moves the body out into a handler-owned request that shares this
    /// request's method, path and headers. `self` is left with an empty body.
    pub(crate) fn detach(&mut self, params: HashMap<String, String>) -> Request {
        Request {
            method: self.method.clone(),
            path: self.path.clone(),
            headers: self.headers.clone(),
            body: self.replace_body(body::empty()),
            params,
        }
    }
}
