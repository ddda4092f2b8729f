//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Handlers build a [`Response`] value and return it; the router writes it
//! into the call's [`ResponseWriter`]. Nothing in between ever needs to know
//! how the bytes were produced.

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::StatusCode;

use crate::context::ResponseWriter;
use crate::error::{BoxError, Error};

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    Soap,         // text/xml; charset=utf-8  (SOAP 1.1)
    Text,         // text/plain; charset=utf-8
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Soap => "text/xml; charset=utf-8",
            Self::Text => "text/plain; charset=utf-8",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use wiretap::{ContentType, Response, StatusCode};
///
/// Response::text("pong");
/// Response::status(StatusCode::NO_CONTENT);
/// Response::builder()
///     .status(StatusCode::INTERNAL_SERVER_ERROR)
///     .bytes(ContentType::Soap, b"<Fault/>".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: StatusCode,
}

impl Response {
    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::bytes_raw(ContentType::Text.as_str(), body.into().into_bytes())
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    fn bytes_raw(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            body,
            headers: vec![(CONTENT_TYPE.as_str().to_owned(), content_type.to_owned())],
            status: StatusCode::OK,
        }
    }

    /// Copies status and headers into `writer`, then writes the body to its sink.
    pub(crate) async fn write_into(self, writer: &mut ResponseWriter) -> Result<(), Error> {
        writer.set_status(self.status);
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::InvalidHeader(name.as_str().to_owned()))?;
            writer.headers_mut().append(name, value);
        }
        writer.write(&self.body).await?;
        Ok(())
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(ContentType::Text.as_str(), body.into().into_bytes())
    }

    /// Terminate with a typed body. Use this for SOAP envelopes.
    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.finish(content_type.as_str(), body)
    }

    pub fn no_body(self) -> Response {
        Response { body: Vec::new(), headers: self.headers, status: self.status }
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![(CONTENT_TYPE.as_str().to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

// ── IntoResponse / IntoOutcome ────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`StatusCode`] directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// What a handler may return: anything that is a response, or a `Result`
/// whose error travels up through the middleware stack untouched.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<Response, BoxError>;
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Result<Response, BoxError> { Ok(self) }
}

impl IntoOutcome for &'static str {
    fn into_outcome(self) -> Result<Response, BoxError> { Ok(self.into_response()) }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Result<Response, BoxError> { Ok(self.into_response()) }
}

impl IntoOutcome for StatusCode {
    fn into_outcome(self) -> Result<Response, BoxError> { Ok(self.into_response()) }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoResponse,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<Response, BoxError> {
        self.map(IntoResponse::into_response).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BufferSink;
    use crate::context::HttpContext;
    use crate::request::Request;

    fn context(sink: &BufferSink) -> HttpContext {
        let req = http::Request::builder().uri("/").body(crate::body::empty()).unwrap();
        HttpContext::new(Request::from_http(req), Box::new(sink.clone()))
    }

    #[tokio::test]
    async fn write_into_copies_head_and_body() {
        let sink = BufferSink::new();
        let mut cx = context(&sink);

        Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/echo/1")
            .text("made")
            .write_into(cx.response_mut())
            .await
            .unwrap();

        assert_eq!(cx.response().status(), StatusCode::CREATED);
        assert_eq!(cx.response().headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(cx.response().headers()["location"], "/echo/1");
        assert_eq!(sink.take(), b"made");
    }

    #[tokio::test]
    async fn invalid_header_name_is_an_error() {
        let sink = BufferSink::new();
        let mut cx = context(&sink);

        let err = Response::builder()
            .header("bad header", "x")
            .no_body()
            .write_into(cx.response_mut())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidHeader(ref name) if name == "bad header"));
    }

    #[test]
    fn result_errors_pass_through_outcome() {
        let outcome: Result<Response, std::io::Error> =
            Err(std::io::Error::other("boom"));
        let err = outcome.into_outcome().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
