//! Per-call context handed down the middleware pipeline.

use http::{HeaderMap, StatusCode};
use tokio::io::AsyncWriteExt;

use crate::body::Sink;
use crate::request::Request;

/// The mutable state of one HTTP call: the inbound request and the outbound
/// status, headers and body sink.
///
/// Middleware receives `&mut HttpContext` and may replace the body stream or
/// the response sink before calling the rest of the pipeline.
pub struct HttpContext {
    request: Request,
    response: ResponseWriter,
}

impl HttpContext {
    pub fn new(request: Request, sink: Sink) -> Self {
        Self { request, response: ResponseWriter::new(sink) }
    }

    pub fn request(&self) -> &Request { &self.request }
    pub fn request_mut(&mut self) -> &mut Request { &mut self.request }
    pub fn response(&self) -> &ResponseWriter { &self.response }
    pub fn response_mut(&mut self) -> &mut ResponseWriter { &mut self.response }

    /// Splits the context into its request and response halves.
    pub fn into_parts(self) -> (Request, ResponseWriter) {
        (self.request, self.response)
    }
}

/// The outbound half of a call.
///
/// Status and headers are plain values until the server turns them into a
/// wire response; the body goes straight to the sink.
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    sink: Sink,
}

impl ResponseWriter {
    fn new(sink: Sink) -> Self {
        Self { status: StatusCode::OK, headers: HeaderMap::new(), sink }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn set_status(&mut self, status: StatusCode) { self.status = status; }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn sink_mut(&mut self) -> &mut Sink { &mut self.sink }

    /// Swaps in a new sink and returns the previous one.
    pub fn replace_sink(&mut self, sink: Sink) -> Sink {
        std::mem::replace(&mut self.sink, sink)
    }

    /// Writes `bytes` to the current sink.
    pub async fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.sink.write_all(bytes).await
    }

    pub(crate) fn into_head(self) -> (StatusCode, HeaderMap) {
        (self.status, self.headers)
    }
}
