use std::{sync::Arc, time::Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::future::join_all;
use stashex_collector::metrics::{MetricSink, drain};
use tracing::debug;

use crate::{exposition, router::ExporterState};

/// One pull cycle: every aggregate scrapes concurrently, then the channel is drained and
/// rendered.
pub async fn telemetry(State(state): State<Arc<ExporterState>>) -> impl IntoResponse {
    let started_at = Instant::now();
    let (sink, mut receiver) = MetricSink::channel();

    join_all(state.aggregates.iter().map(|aggregate| aggregate.scrape(&sink))).await;
    sink.emit(state.build_info_sample());

    let samples = drain(&mut receiver);
    debug!(
        samples = samples.len(),
        instances = state.aggregates.len(),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "pull cycle finished"
    );

    let mut response = Response::new(Body::from(exposition::render(samples)));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(exposition::CONTENT_TYPE),
    );

    response
}
