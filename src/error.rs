//! Unified error type.

use std::fmt;

/// A type-erased error travelling through the middleware pipeline.
///
/// Handlers and middleware hand errors upward as `BoxError` so that a layer
/// can return the exact value it received without knowing its concrete type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by wiretap's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: binding a port, writing to a response sink,
/// building an invalid header, or reading malformed configuration.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    InvalidHeader(String),
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::InvalidHeader(name) => write!(f, "invalid header: {name}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::InvalidHeader(_) | Self::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
