//! SOAP-style RPC dispatch with message inspectors.
//!
//! A [`Dispatcher`] maps actions to [`Operation`]s. Every call passes
//! through the registered [`MessageInspector`]s: once with the request,
//! once with the reply. [`LogMessageInspector`] logs both.
//!
//! Mount a dispatcher on a route with [`Dispatcher::into_handler`]; the HTTP
//! [`AuditLayer`](crate::middleware::audit::AuditLayer) and the inspectors
//! can run on the same call.

mod dispatcher;
mod inspector;
mod message;

pub use dispatcher::{Dispatcher, Operation};
pub use inspector::{Correlation, LogMessageInspector, MessageInspector};
pub use message::{Fault, FaultCode, Message, ENVELOPE_NS};
