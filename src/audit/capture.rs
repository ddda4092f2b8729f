//! Body capture on both sides of a call.
//!
//! Request bodies are read once and replayed from memory; response sinks are
//! swapped for a buffer and the buffer is forwarded to the real sink when the
//! call is over. Neither side changes a single byte.

use std::io;

use http_body_util::BodyExt;
use tokio::io::AsyncWriteExt;

use crate::body::{self, BufferSink, Sink};
use crate::context::ResponseWriter;
use crate::error::BoxError;
use crate::request::Request;

/// Reads the request body to a string and leaves an identical, unread body
/// in its place.
///
/// Without a declared non-zero `content-length` nothing is read and `""` is
/// returned; some transports never signal end-of-stream on an empty body.
/// If reading fails the error is returned and the request is left with an
/// empty body, since the original stream is already partly consumed.
pub async fn capture_request_body(req: &mut Request) -> Result<String, BoxError> {
    match req.content_length() {
        None | Some(0) => return Ok(String::new()),
        Some(_) => {}
    }

    let stream = req.replace_body(body::empty());
    let bytes = stream.collect().await?.to_bytes();
    let text = decode(&bytes);
    req.replace_body(body::full(bytes));
    Ok(text)
}

/// A response sink that has been swapped out for an in-memory buffer.
///
/// Created by [`install`](Self::install) before the downstream call and
/// consumed by [`finish`](Self::finish) after it, so the buffered bytes reach
/// the real sink at most once.
#[must_use = "a response capture must be finished or the response is lost"]
pub struct ResponseCapture {
    buffer: BufferSink,
    original: Sink,
}

impl ResponseCapture {
    /// Points `writer` at a fresh buffer and keeps hold of the real sink.
    pub fn install(writer: &mut ResponseWriter) -> Self {
        let buffer = BufferSink::new();
        let original = writer.replace_sink(Box::new(buffer.clone()));
        Self { buffer, original }
    }

    /// A handle on the capture buffer, for reading what was written so far.
    pub(crate) fn buffer(&self) -> BufferSink {
        self.buffer.clone()
    }

    /// Restores the real sink, forwards everything buffered to it, and
    /// returns the buffered bytes decoded as UTF-8.
    pub async fn finish(self, writer: &mut ResponseWriter) -> io::Result<String> {
        let Self { buffer, original } = self;
        drop(writer.replace_sink(original));

        let bytes = buffer.take();
        writer.write(&bytes).await?;
        writer.sink_mut().flush().await?;
        Ok(decode(&bytes))
    }
}

fn decode(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use bytes::Bytes;
    use hyper::body::{Body, Frame};

    use crate::body::Body as RequestBody;
    use crate::context::HttpContext;

    /// Panics if anyone polls it.
    struct Untouchable;

    impl Body for Untouchable {
        type Data = Bytes;
        type Error = BoxError;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
            panic!("body was read");
        }
    }

    /// Fails on first poll.
    struct Broken;

    impl Body for Broken {
        type Data = Bytes;
        type Error = BoxError;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
            Poll::Ready(Some(Err("connection reset".into())))
        }
    }

    fn request(content_length: Option<&str>, body: RequestBody) -> Request {
        let mut builder = http::Request::builder().method("POST").uri("/");
        if let Some(len) = content_length {
            builder = builder.header("content-length", len);
        }
        Request::from_http(builder.body(body).unwrap())
    }

    #[tokio::test]
    async fn request_body_is_replayed() {
        let mut req = request(Some("7"), body::full("<Echo/>"));

        let captured = capture_request_body(&mut req).await.unwrap();

        assert_eq!(captured, "<Echo/>");
        assert_eq!(req.text().await.unwrap(), "<Echo/>");
    }

    #[tokio::test]
    async fn missing_content_length_skips_the_read() {
        let mut req = request(None, Untouchable.boxed());
        assert_eq!(capture_request_body(&mut req).await.unwrap(), "");
    }

    #[tokio::test]
    async fn zero_content_length_skips_the_read() {
        let mut req = request(Some("0"), Untouchable.boxed());
        assert_eq!(capture_request_body(&mut req).await.unwrap(), "");
    }

    #[tokio::test]
    async fn read_failure_is_reported() {
        let mut req = request(Some("5"), Broken.boxed());

        let err = capture_request_body(&mut req).await.unwrap_err();

        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(req.text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_but_bytes_are_kept() {
        let mut req = request(Some("3"), body::full(&b"a\xffb"[..]));

        let captured = capture_request_body(&mut req).await.unwrap();

        assert_eq!(captured, "a\u{fffd}b");
        assert_eq!(&req.bytes().await.unwrap()[..], b"a\xffb");
    }

    #[tokio::test]
    async fn response_is_buffered_then_forwarded() {
        let real = BufferSink::new();
        let mut cx = HttpContext::new(request(None, body::empty()), Box::new(real.clone()));

        let capture = ResponseCapture::install(cx.response_mut());
        cx.response_mut().write(b"pong").await.unwrap();
        assert!(real.is_empty());

        let captured = capture.finish(cx.response_mut()).await.unwrap();

        assert_eq!(captured, "pong");
        assert_eq!(real.take(), b"pong");

        // The real sink is back in place.
        cx.response_mut().write(b"!").await.unwrap();
        assert_eq!(real.take(), b"!");
    }

    #[tokio::test]
    async fn empty_response_forwards_nothing() {
        let real = BufferSink::new();
        let mut cx = HttpContext::new(request(None, body::empty()), Box::new(real.clone()));

        let capture = ResponseCapture::install(cx.response_mut());
        let captured = capture.finish(cx.response_mut()).await.unwrap();

        assert_eq!(captured, "");
        assert!(real.is_empty());
    }
}
