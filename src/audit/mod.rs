//! Capture primitives used by the audit middleware.
//!
//! These are the leaves: turning header collections into stable snapshots,
//! and reading bodies without disturbing the call. [`AuditLayer`] composes
//! them around a downstream call.
//!
//! [`AuditLayer`]: crate::middleware::audit::AuditLayer

mod capture;
mod headers;

pub use capture::{capture_request_body, ResponseCapture};
pub use headers::{HeaderSnapshot, HeaderText};
