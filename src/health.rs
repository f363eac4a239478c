//! Built-in health-check handlers.
//!
//! Register them as actions on any convention-routed controller, or reach
//! for them from a custom transport:
//!
//! ```rust,no_run
//! use arbor::{ActionDef, ControllerDef, Method, health};
//!
//! let ops = ControllerDef::new()
//!     .action("healthz", ActionDef::new().method(Method::Get).path("healthz").handler(health::liveness))
//!     .action("readyz", ActionDef::new().method(Method::Get).path("readyz").handler(health::readiness));
//! ```

use crate::{Request, Response};

/// Liveness probe handler.
///
/// Always returns `200 OK` with body `"ok"`: if the process can respond to
/// HTTP at all, it is alive. Intentionally dependency-free.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// Readiness probe handler (default implementation).
///
/// Returns `200 OK` with body `"ready"`. Replace with your own action if
/// the application must verify dependency health before accepting traffic.
pub async fn readiness(_req: Request) -> Response {
    Response::text("ready")
}
