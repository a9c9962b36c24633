//! Route table.

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use log::debug;
use std::sync::Arc;
use tokio::time::Instant;
use tower_http::cors::{Any, CorsLayer};

use crate::http::handlers;
use crate::http::state::{AppContext, AppState};

pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/start-test", post(handlers::measurement::start))
        .route("/test-status", get(handlers::measurement::status))
        .route("/test-progress", get(handlers::measurement::progress))
        .route("/test-events", get(handlers::measurement::events))
        .route("/results", get(handlers::measurement::results))
        .route("/server-info", get(handlers::servers::server_info))
        .route("/debug", get(handlers::servers::debug))
        .route("/submit-feedback", post(handlers::feedback::submit))
        .route("/health", get(handlers::health::health))
}

/// Build the application router with every endpoint under `/api`.
pub fn create_router(ctx: AppContext) -> Router {
    let state: AppState = Arc::new(ctx);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes().with_state(state))
        .layer(cors)
        .layer(middleware::from_fn(log_request))
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    debug!(
        "{} {} -> {} in {:?}",
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}
