use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("POI provider error: {0}")]
    PoiProvider(String),

    #[error("Route optimizer error: {0}")]
    Optimizer(String),

    #[error("Description enrichment error: {0}")]
    Enrichment(String),

    #[error("Travel time matrix error: {0}")]
    TravelTime(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::PoiProvider(ref e) => {
                tracing::error!("POI provider error: {}", e);
                (StatusCode::BAD_GATEWAY, "POI provider error")
            }
            AppError::Optimizer(ref e) => {
                tracing::error!("Route optimizer error: {}", e);
                (StatusCode::BAD_GATEWAY, "Route optimizer error")
            }
            AppError::Enrichment(ref e) => {
                tracing::warn!("Description enrichment error: {}", e);
                (StatusCode::BAD_GATEWAY, "Description service error")
            }
            AppError::TravelTime(ref e) => {
                tracing::warn!("Travel time matrix error: {}", e);
                (StatusCode::BAD_GATEWAY, "Routing service error")
            }
            AppError::InvalidRequest(ref e) => (StatusCode::BAD_REQUEST, e.as_str()),
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
