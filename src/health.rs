//! Built-in health-check handlers.
//!
//! | Probe | Conventional path | Question |
//! |---|---|---|
//! | **Liveness** | `/alive` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/health` | Can the service take traffic? Failure → pulled from load-balancer. |
//!
//! ```rust,no_run
//! use wiretap::{health, Method, Router};
//!
//! let app = Router::new()
//!     .on(Method::GET, "/alive", health::liveness)
//!     .on(Method::GET, "/health", health::readiness);
//! ```
//!
//! Probes are ordinary routes, so an [`AuditLayer`](crate::middleware::audit::AuditLayer)
//! on the router logs them too. Use `soap_only` to keep them out of the audit trail.

use crate::{Request, Response};

/// Always `200 OK` with body `"Healthy"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("Healthy")
}

/// `200 OK` with body `"Healthy"`. Replace with a handler that checks
/// downstream dependencies when the service has any.
pub async fn readiness(_req: Request) -> Response {
    Response::text("Healthy")
}
