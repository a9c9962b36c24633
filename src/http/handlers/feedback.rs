//! Feedback handler. Feedback is only logged.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use log::{info, warn};

use crate::http::dto::{FeedbackRequest, FeedbackResponse};
use crate::http::error::ApiError;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

pub async fn submit(
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let Json(feedback) = payload.map_err(|e| {
        warn!("Error submitting feedback: {}", e.body_text());
        ApiError::Feedback(e.body_text())
    })?;

    if !(MIN_RATING..=MAX_RATING).contains(&feedback.rating) {
        warn!("Rejected feedback with rating {}", feedback.rating);
        return Err(ApiError::Feedback(format!(
            "rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, feedback.rating
        )));
    }

    info!(
        "Feedback received - Rating: {}, Comments: {}",
        feedback.rating, feedback.comments
    );

    Ok(Json(FeedbackResponse::accepted()))
}
