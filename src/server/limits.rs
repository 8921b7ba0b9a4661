use crate::error::ApiError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Rewrites any 413, including the body-limit layer's own plain-text rejection,
/// into the JSON error body clients expect.
pub async fn payload_too_large(State(limit_mb): State<usize>, response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit_mb }.into_response()
    } else {
        response
    }
}
