use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::router::ExporterState;

pub async fn healthy() -> impl IntoResponse {
    (StatusCode::OK, "Healthy")
}

pub async fn landing(State(state): State<Arc<ExporterState>>) -> impl IntoResponse {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, state.telemetry_path.clone())],
    )
}
