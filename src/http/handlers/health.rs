use axum::Json;

use crate::http::dto::HealthResponse;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
