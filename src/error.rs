//! Error taxonomy for the estimation service.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Every failure the service can surface to a caller.
///
/// Caller-input errors (`InvalidCoordinateFormat`, `OutOfRegion`,
/// `InvalidParameters`) are recoverable by resubmitting corrected input.
/// `ProviderUnavailable` is only ever surfaced from the geocoding
/// pass-throughs; the irradiance path absorbs it into the fallback reading.
/// `Computation` is an internal failure, fatal for that request only.
#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("invalid coordinates: latitude and longitude must be numeric")]
    InvalidCoordinateFormat,

    #[error("coordinates are outside the supported region (Colombia)")]
    OutOfRegion,

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("external service unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("internal computation failure")]
    Computation(String),
}

impl EstimatorError {
    fn status(&self) -> StatusCode {
        match self {
            EstimatorError::InvalidCoordinateFormat
            | EstimatorError::OutOfRegion
            | EstimatorError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            EstimatorError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            EstimatorError::Computation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EstimatorError {
    fn into_response(self) -> Response {
        // Computation details stay in the logs; callers get an opaque message.
        let message = match &self {
            EstimatorError::Computation(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        (self.status(), Json(serde_json::json!({ "error": message }))).into_response()
    }
}
