//! # wiretap
//!
//! A small HTTP framework whose reason to exist is its audit layer: every
//! call can leave a correlated pair of log entries describing exactly what
//! came in and what went out, without changing a byte of either.
//!
//! ## The contract
//!
//! - **Transparent**: the handler reads the same request body and the client
//!   receives the same response bytes, with or without auditing.
//! - **Paired**: one `received request` and one `responded` entry per call,
//!   in that order, in one `audit` span with a `correlation_id`, even when the
//!   handler fails.
//! - **Honest errors**: a handler error is logged, then returned untouched.
//!
//! Two call shapes are covered:
//!
//! - HTTP pipelines: [`middleware::audit::AuditLayer`] buffers the request
//!   body and intercepts the response sink.
//! - SOAP-style RPC: [`rpc::LogMessageInspector`] logs complete request and
//!   reply messages around a [`rpc::Dispatcher`] call.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use wiretap::middleware::audit::AuditLayer;
//! use wiretap::{Config, Method, Request, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wiretap::Error> {
//!     let config = Config::from_env()?;
//!
//!     let app = Router::new()
//!         .on(Method::POST, "/ping", ping)
//!         .layer(AuditLayer::with_config(config.audit.clone()));
//!
//!     Server::from_config(&config).serve(app).await
//! }
//!
//! async fn ping(req: Request) -> Result<String, wiretap::BoxError> {
//!     let body = req.text().await?;
//!     Ok(format!("pong {body}"))
//! }
//! ```
//!
//! Installing a `tracing` subscriber is left to the binary.

mod context;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod audit;
pub mod body;
pub mod config;
pub mod health;
pub mod middleware;
pub mod rpc;

pub use config::{AuditConfig, Config};
pub use context::{HttpContext, ResponseWriter};
pub use error::{BoxError, Error};
pub use handler::Handler;
pub use http::{HeaderMap, Method, StatusCode};
pub use request::Request;
pub use response::{ContentType, IntoOutcome, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
