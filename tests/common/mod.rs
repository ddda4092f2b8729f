//! Shared helpers for integration tests: in-memory log capture and calls
//! driven straight through a router without a socket.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::subscriber::DefaultGuard;
use wiretap::body::{self, BufferSink};
use wiretap::middleware::Endpoint;
use wiretap::{HttpContext, Request, Router, StatusCode};

/// Collects formatted log lines. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl LogWriter {
    /// Every log line so far, parsed as JSON.
    pub fn records(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("bad log line {line:?}: {e}")))
            .collect()
    }

    /// Records whose message is `message`, in emission order.
    pub fn with_message(&self, message: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|r| r["message"] == message)
            .collect()
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogWriter {
    type Writer = Self;

    fn make_writer(&self) -> Self::Writer {
        self.clone()
    }
}

/// Routes this thread's `tracing` output into a [`LogWriter`] as flattened
/// JSON, one object per event, with the current span under `"span"`.
///
/// `#[tokio::test]` runs on a single thread, so every event of the test lands
/// here for as long as the guard lives.
pub fn capture_logs() -> (LogWriter, DefaultGuard) {
    let writer = LogWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_max_level(tracing::Level::INFO)
        .with_writer(writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (writer, guard)
}

/// What the client would have received.
pub struct Delivered {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Sends one request through `router`, returning what reached the real sink,
/// or the error that escaped the pipeline.
pub async fn send(
    router: &Router,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    payload: &'static str,
) -> Result<Delivered, wiretap::BoxError> {
    let mut builder = http::Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    if !payload.is_empty() {
        builder = builder.header("content-length", payload.len().to_string());
    }
    let req = Request::from_http(builder.body(body::full(payload)).unwrap());

    let sink = BufferSink::new();
    let mut cx = HttpContext::new(req, Box::new(sink.clone()));
    router.call(&mut cx).await?;

    Ok(Delivered {
        status: cx.response().status(),
        content_type: cx
            .response()
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body: sink.take(),
    })
}

pub fn correlation_id(record: &Value) -> &str {
    record["span"]["correlation_id"]
        .as_str()
        .unwrap_or_else(|| panic!("no correlation id in {record}"))
}
