//! Measurement handlers - start a run and observe it.

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures_util::stream::Stream;
use std::convert::Infallible;

use crate::http::dto::{ResultsResponse, StartResponse, TestStatusResponse};
use crate::http::sse::progress_stream;
use crate::http::state::AppState;
use crate::measurement::ProgressState;

/// Start a measurement. A run already in flight is reported with
/// `status: "error"`, not an HTTP error.
pub async fn start(State(state): State<AppState>) -> Json<StartResponse> {
    Json(state.orchestrator.start_measurement().into())
}

pub async fn status(State(state): State<AppState>) -> Json<TestStatusResponse> {
    let progress = state.orchestrator.snapshot();
    let latest = state.orchestrator.latest_result();
    Json(TestStatusResponse::new(progress, latest))
}

pub async fn progress(State(state): State<AppState>) -> Json<ProgressState> {
    Json(state.orchestrator.snapshot())
}

pub async fn results(State(state): State<AppState>) -> Json<ResultsResponse> {
    Json(ResultsResponse {
        current: state.orchestrator.latest_result(),
        history: state.orchestrator.history(),
    })
}

/// Push every progress change to the client.
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    progress_stream(state.orchestrator.subscribe())
}
