//! Server directory handlers. These query the provider directly and may
//! run while a measurement is in flight.

use axum::extract::State;
use axum::Json;

use crate::http::dto::{version, DebugResponse};
use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::measurement::{sample_servers, DirectorySample};

/// A few candidate servers and the number of regions listed.
pub async fn server_info(
    State(state): State<AppState>,
) -> Result<Json<DirectorySample>, ApiError> {
    Ok(Json(sample_servers(state.provider.as_ref()).await?))
}

pub async fn debug(
    State(state): State<AppState>,
) -> Result<Json<DebugResponse>, ApiError> {
    let sample = sample_servers(state.provider.as_ref()).await?;

    Ok(Json(DebugResponse {
        servers_available: sample.total_servers > 0,
        total_servers: sample.total_servers,
        version: version(),
    }))
}
