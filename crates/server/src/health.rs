use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::api::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentCheck {
    pub status: &'static str,
    pub configured: bool,
}

impl ComponentCheck {
    fn of(configured: bool) -> Self {
        Self { status: if configured { "ready" } else { "disabled" }, configured }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub router: ComponentCheck,
    pub fulfillment: ComponentCheck,
    pub worker: ComponentCheck,
    pub checked_at: String,
}

/// The process is healthy as long as it serves requests; disabled components
/// only downgrade the summary.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let router = ComponentCheck::of(state.router.is_some());
    let fulfillment = ComponentCheck::of(state.fulfillment.is_some());
    let worker = ComponentCheck::of(state.worker.is_some());
    let complete = router.configured && fulfillment.configured && worker.configured;

    let payload = HealthResponse {
        status: if complete { "ready" } else { "degraded" },
        router,
        fulfillment,
        worker,
        checked_at: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(payload))
}
