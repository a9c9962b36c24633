//! Request and response bodies of the JSON API.

use crate::measurement::{
    MeasurementResult, ProgressState, ResultHistory, StartOutcome, TestStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Crate version, with the git revision when the build could read one.
pub fn version() -> String {
    match option_env!("SPEEDTEST_SERVICE_BUILD_GIT_HASH") {
        Some(hash) => format!("{} ({})", env!("CARGO_PKG_VERSION"), hash),
        None => env!("CARGO_PKG_VERSION").to_string(),
    }
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    /// `started` or `error`
    pub status: &'static str,
    pub message: String,
}

impl From<StartOutcome> for StartResponse {
    fn from(outcome: StartOutcome) -> Self {
        Self {
            status: if outcome.started { "started" } else { "error" },
            message: outcome.message,
        }
    }
}

/// Poll answer: results once completed, the progress message otherwise.
#[derive(Debug, Serialize)]
pub struct TestStatusResponse {
    pub status: TestStatus,
    pub progress: ProgressState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<MeasurementResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TestStatusResponse {
    pub fn new(progress: ProgressState, latest: Option<MeasurementResult>) -> Self {
        let status = progress.status;

        match latest {
            Some(results) if status == TestStatus::Completed => Self {
                status,
                progress,
                results: Some(results),
                message: None,
            },
            _ => Self {
                status,
                message: Some(progress.message.clone()),
                progress,
                results: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub current: Option<MeasurementResult>,
    pub history: ResultHistory,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub rating: i64,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl FeedbackResponse {
    pub fn accepted() -> Self {
        Self { status: "success", message: "Thank you for your feedback!" }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub speedtest_available: bool,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            timestamp: Utc::now(),
            speedtest_available: true,
            version: version(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub servers_available: bool,
    pub total_servers: usize,
    pub version: String,
}
