use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{analyzer::AnalysisError, chat::ChatError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Failed to process chat request")]
    Chat(#[from] ChatError),

    #[error("Failed to analyze skin images")]
    Upload(#[from] std::io::Error),
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::NoImages => AppError::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Chat(e) => {
                tracing::error!("❌ Chat request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Upload(e) => {
                tracing::error!("❌ Skin analysis failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        let cases = [
            (AppError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED),
            (AppError::from(AnalysisError::NoImages), StatusCode::BAD_REQUEST),
            (AppError::from(ChatError::MissingCredentials), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::from(std::io::Error::other("disk full")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn upstream_detail_stays_out_of_the_message() {
        let err = AppError::from(ChatError::Status { status: 401, body: "invalid key sk-123".into() });
        assert_eq!(err.to_string(), "Failed to process chat request");
    }
}
