//! Body types shared by requests and responses.
//!
//! Request bodies are streams ([`Body`]); they are only read when someone
//! asks for them. Response bodies are written through an [`AsyncWrite`] sink
//! owned by the [`ResponseWriter`](crate::ResponseWriter). [`BufferSink`] is
//! the in-memory sink the server hands to every call.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full};
use tokio::io::AsyncWrite;

use crate::error::BoxError;

/// A type-erased request body stream.
pub type Body = http_body_util::combinators::BoxBody<Bytes, BoxError>;

/// A boxed response sink.
pub type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// A body with no content.
pub fn empty() -> Body {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

/// A body that yields `bytes` once, then ends.
pub fn full(bytes: impl Into<Bytes>) -> Body {
    Full::new(bytes.into()).map_err(|never| match never {}).boxed()
}

/// Growable in-memory sink. Clones share the same buffer.
///
/// The server gives one to each call as the real response sink and reads it
/// back once the pipeline returns; the audit layer uses a private one as its
/// capture buffer.
#[derive(Clone, Default)]
pub struct BufferSink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything written so far.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AsyncWrite for BufferSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.lock().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
