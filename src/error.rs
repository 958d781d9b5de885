use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::enhance::EnhanceError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream request failed: {0}")]
    UpstreamRequest(String),

    #[error("Upstream responded with status {0}")]
    UpstreamStatus(u16),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error(transparent)]
    Enhance(#[from] EnhanceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::MissingParam(_) => (StatusCode::BAD_REQUEST, "MISSING_PARAM"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::UpstreamRequest(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            // Pass the upstream status through when it is a valid error code,
            // matching the original image proxy behavior.
            ApiError::UpstreamStatus(s) => (
                StatusCode::from_u16(*s)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                "UPSTREAM_ERROR",
            ),
            ApiError::Decode(_) => (StatusCode::UNPROCESSABLE_ENTITY, "DECODE_ERROR"),
            ApiError::Enhance(EnhanceError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT")
            }
            ApiError::Enhance(EnhanceError::ProcessingFailure(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PROCESSING_FAILURE")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
