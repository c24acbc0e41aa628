use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::types::ProviderKind;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    provider: ProviderKind,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.signals.provider_kind(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}
