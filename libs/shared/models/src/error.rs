use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Failures reported by a doctor catalog (mock or remote).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Server error (status {0})")]
    ServerError(u16),

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Failed to decode response: {0}")]
    Decoding(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            FetchError::InvalidRequest(msg) => AppError::BadRequest(msg),
            other => AppError::ExternalService(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::ExternalService(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        tracing::error!("Error: {}: {}", status, message);

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_fetch_error_maps_to_app_error() {
        assert_matches!(AppError::from(FetchError::NotFound), AppError::NotFound(_));
        assert_matches!(
            AppError::from(FetchError::InvalidRequest("bad page".into())),
            AppError::BadRequest(msg) if msg == "bad page"
        );
        assert_matches!(AppError::from(FetchError::ServerError(503)), AppError::ExternalService(_));
        assert_matches!(AppError::from(FetchError::Timeout(30_000)), AppError::ExternalService(_));
    }

    #[test]
    fn test_app_error_status_codes() {
        let response = AppError::NotFound("session".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::ExternalService("catalog down".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_fetch_error_serializes_with_kind() {
        let value = serde_json::to_value(FetchError::ServerError(500)).unwrap();
        assert_eq!(value, json!({ "kind": "server_error", "detail": 500 }));

        let value = serde_json::to_value(FetchError::Unauthorized).unwrap();
        assert_eq!(value, json!({ "kind": "unauthorized" }));
    }
}
