//! Request/response audit logging.
//!
//! [`AuditLayer`] wraps the rest of the pipeline and emits exactly two
//! `tracing` events per call, both inside an `audit` span carrying a fresh
//! `correlation_id`:
//!
//! | Event | Level | Fields |
//! |---|---|---|
//! | `received request` | INFO | `RequestMethod`, `RequestPath`, `RequestHeaders`, `RequestBody` |
//! | `responded` | INFO | `ResponseCode`, `RequestPath`, `ResponseHeaders`, `ResponseBody` |
//!
//! Headers are logged as indented JSON. A failing downstream call adds an
//! ERROR event between the two and its error is returned unchanged after
//! the `responded` entry has been written. The bytes the client receives
//! are exactly the bytes the handler wrote.
//!
//! A call that is dropped mid-flight (client gone, outer timeout) still gets
//! its `responded` entry, marked `cancelled = true` and carrying whatever
//! body had been written so far.
//!
//! ```rust,no_run
//! use wiretap::middleware::audit::AuditLayer;
//! use wiretap::{Method, Router, Server};
//!
//! # async fn ping(_: wiretap::Request) -> &'static str { "pong" }
//! # async fn run() -> Result<(), wiretap::Error> {
//! let app = Router::new()
//!     .on(Method::POST, "/ping", ping)
//!     .layer(AuditLayer::new());
//!
//! Server::bind("0.0.0.0:3000".parse().unwrap()).serve(app).await
//! # }
//! ```

use tracing::{error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use super::{BoxFuture, HandlerResult, Middleware, Next};
use crate::audit::{capture_request_body, HeaderSnapshot, ResponseCapture};
use crate::body::BufferSink;
use crate::config::AuditConfig;
use crate::context::HttpContext;
use crate::request::Request;

/// Header that marks a SOAP 1.1 call.
pub const SOAP_ACTION: &str = "soapaction";

/// Middleware that logs what went into and came out of every call.
///
/// Holds configuration only; every buffer and snapshot lives in the call
/// that created it.
#[derive(Clone, Debug, Default)]
pub struct AuditLayer {
    config: AuditConfig,
}

impl AuditLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AuditConfig) -> Self {
        Self { config }
    }

    fn applies_to(&self, req: &Request) -> bool {
        self.config.enabled && (!self.config.soap_only || is_soap_request(req))
    }
}

/// True when the request carries a non-empty `SOAPAction` header.
fn is_soap_request(req: &Request) -> bool {
    req.headers()
        .get(SOAP_ACTION)
        .is_some_and(|action| !action.is_empty())
}

impl Middleware for AuditLayer {
    fn handle<'a>(&'a self, cx: &'a mut HttpContext, next: Next<'a>) -> BoxFuture<'a, HandlerResult> {
        if !self.applies_to(cx.request()) {
            return next.run(cx);
        }
        let span = info_span!("audit", correlation_id = %Uuid::new_v4());
        Box::pin(audit(cx, next).instrument(span))
    }
}

async fn audit(cx: &mut HttpContext, next: Next<'_>) -> HandlerResult {
    let method = cx.request().method().clone();
    let path = cx.request().path().to_owned();
    let request_headers = HeaderSnapshot::from_header_map(cx.request().headers());
    let request_body = capture_request_body(cx.request_mut())
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "request body capture failed");
            String::new()
        });

    info!(
        RequestMethod = %method,
        RequestPath = %path,
        RequestHeaders = %request_headers,
        RequestBody = %request_body,
        "received request"
    );

    let capture = ResponseCapture::install(cx.response_mut());
    let pending = Pending::arm(&path, capture.buffer());
    let outcome = next.run(cx).await;
    if let Err(e) = &outcome {
        error!(error = %e, detail = ?e, "downstream handler failed");
    }

    let (response_body, forward_error) = match capture.finish(cx.response_mut()).await {
        Ok(body) => (body, None),
        Err(e) => {
            warn!(error = %e, "forwarding captured response failed");
            (String::new(), Some(e))
        }
    };
    let response_headers = HeaderSnapshot::from_header_map(cx.response().headers());

    pending.disarm();
    info!(
        ResponseCode = cx.response().status().as_u16(),
        RequestPath = %path,
        ResponseHeaders = %response_headers,
        ResponseBody = %response_body,
        "responded"
    );

    match (outcome, forward_error) {
        (Err(e), _) => Err(e),
        (Ok(()), Some(e)) => Err(e.into()),
        (Ok(()), None) => Ok(()),
    }
}

/// Stands in for the `responded` entry of a call whose future is dropped
/// before it completes, such as on client disconnect or an outer timeout.
struct Pending {
    span: Span,
    path: String,
    buffer: Option<BufferSink>,
}

impl Pending {
    fn arm(path: &str, buffer: BufferSink) -> Self {
        Self { span: Span::current(), path: path.to_owned(), buffer: Some(buffer) }
    }

    fn disarm(mut self) {
        self.buffer = None;
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        let Some(buffer) = self.buffer.take() else {
            return;
        };
        let _entered = self.span.enter();
        let response_body = String::from_utf8_lossy(&buffer.take()).into_owned();

        error!(cancelled = true, "downstream handler cancelled");
        info!(
            RequestPath = %self.path,
            ResponseBody = %response_body,
            cancelled = true,
            "responded"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::io;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};

    use http::StatusCode;
    use tokio::io::AsyncWrite;

    use super::*;
    use crate::body::{self, BufferSink};
    use crate::error::BoxError;
    use crate::middleware::{endpoint_fn, Endpoint, Middleware};

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl std::error::Error for Boom {}

    /// A sink whose writes always fail.
    struct Closed;

    impl AsyncWrite for Closed {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }
        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn context(headers: &[(&str, &str)], body: &'static str, sink: crate::body::Sink) -> HttpContext {
        let mut builder = http::Request::builder().method("POST").uri("/ping");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let req = Request::from_http(builder.body(body::full(body)).unwrap());
        HttpContext::new(req, sink)
    }

    async fn run(layer: AuditLayer, endpoint: &dyn Endpoint, cx: &mut HttpContext) -> HandlerResult {
        let layers: Vec<Arc<dyn Middleware>> = vec![Arc::new(layer)];
        Next::new(endpoint, &layers).run(cx).await
    }

    async fn echo_inner(cx: &mut HttpContext) -> HandlerResult {
        let body = cx.request_mut().replace_body(body::empty());
        let bytes = http_body_util::BodyExt::collect(body).await?.to_bytes();
        cx.response_mut().set_status(StatusCode::ACCEPTED);
        cx.response_mut().write(&bytes).await?;
        Ok(())
    }

    async fn fail_inner(cx: &mut HttpContext) -> HandlerResult {
        cx.response_mut().write(b"partial").await?;
        Err(Box::new(Boom))
    }

    #[tokio::test]
    async fn handler_sees_the_body_and_client_gets_the_bytes() {
        let real = BufferSink::new();
        let mut cx = context(&[("content-length", "4")], "ping", Box::new(real.clone()));
        let echo = endpoint_fn(|cx| Box::pin(echo_inner(cx)));

        run(AuditLayer::new(), &echo, &mut cx).await.unwrap();

        assert_eq!(cx.response().status(), StatusCode::ACCEPTED);
        assert_eq!(real.take(), b"ping");
    }

    #[tokio::test]
    async fn downstream_error_is_returned_unchanged() {
        let real = BufferSink::new();
        let mut cx = context(&[], "", Box::new(real.clone()));
        let fail = endpoint_fn(|cx| Box::pin(fail_inner(cx)));

        let err: BoxError = run(AuditLayer::new(), &fail, &mut cx).await.unwrap_err();

        assert!(err.downcast_ref::<Boom>().is_some());
        assert_eq!(err.to_string(), "boom");
        // What was written before the failure still reaches the client.
        assert_eq!(real.take(), b"partial");
    }

    #[tokio::test]
    async fn forwarding_failure_surfaces_when_handler_succeeded() {
        let mut cx = context(&[("content-length", "4")], "ping", Box::new(Closed));
        let echo = endpoint_fn(|cx| Box::pin(echo_inner(cx)));

        let err = run(AuditLayer::new(), &echo, &mut cx).await.unwrap_err();

        let io = err.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn handler_error_wins_over_forwarding_failure() {
        let mut cx = context(&[], "", Box::new(Closed));
        let fail = endpoint_fn(|cx| Box::pin(fail_inner(cx)));

        let err = run(AuditLayer::new(), &fail, &mut cx).await.unwrap_err();

        assert!(err.downcast_ref::<Boom>().is_some());
    }

    #[test]
    fn soap_filter() {
        let soap_only = AuditLayer::with_config(AuditConfig::default().soap_only(true));
        let sink = || -> crate::body::Sink { Box::new(BufferSink::new()) };

        let soap = context(&[("SOAPAction", "\"urn:Echo\"")], "", sink());
        let empty_action = context(&[("SOAPAction", "")], "", sink());
        let plain = context(&[], "", sink());

        assert!(soap_only.applies_to(soap.request()));
        assert!(!soap_only.applies_to(empty_action.request()));
        assert!(!soap_only.applies_to(plain.request()));
        assert!(AuditLayer::new().applies_to(plain.request()));
        assert!(!AuditLayer::with_config(AuditConfig::default().enabled(false)).applies_to(soap.request()));
    }
}
