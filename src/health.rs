//! Liveness and readiness probes.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Is the pastes directory there to serve from? |

use std::sync::Arc;

use crate::api::AppState;
use crate::{Request, Response, Status};

/// Always `200 OK` with body `"ok"`.
pub async fn liveness(_state: Arc<AppState>, _req: Request) -> Response {
    Response::text("ok")
}

/// `200 OK` while the pastes directory exists, `503` otherwise.
pub async fn readiness(state: Arc<AppState>, _req: Request) -> Response {
    if state.store.dir().is_dir() {
        Response::text("ready")
    } else {
        Response::status(Status::ServiceUnavailable)
    }
}
