// 🚨 API Errors - how failures become HTTP responses
//
// Validation and not-found errors answer directly. Store failures are routed
// to `handle_internal_errors`, the one generic stage that logs them and
// decides how much the client gets to see.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::app::AppState;

pub const ARTICLE_NOT_FOUND: &str = "Article does not exist";
pub const SERVER_ERROR: &str = "server error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Client sent a body that fails validation
    #[error("{0}")]
    Validation(String),

    #[error("{}", ARTICLE_NOT_FOUND)]
    NotFound,

    /// Anything the store (or the runtime around it) reports
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn missing_field(field: &str) -> Self {
        ApiError::Validation(format!("Missing '{}' in request body", field))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `{ "error": { "message": ... } }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorMessage {
                message: message.into(),
            },
        }
    }
}

/// Detail of an internal failure, carried in response extensions
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            ApiError::Internal(e) => {
                let mut response = (status, Json(ErrorBody::new(SERVER_ERROR))).into_response();
                response
                    .extensions_mut()
                    .insert(InternalErrorDetail(format!("{:#}", e)));
                response
            }
            other => (status, Json(ErrorBody::new(other.to_string()))).into_response(),
        }
    }
}

/// Generic error stage, installed as response middleware
///
/// Outside production the error's text replaces the opaque message.
pub async fn handle_internal_errors(State(state): State<AppState>, response: Response) -> Response {
    let Some(InternalErrorDetail(detail)) = response.extensions().get::<InternalErrorDetail>().cloned()
    else {
        return response;
    };

    tracing::error!(error = %detail, "request failed");

    if state.production {
        return response;
    }

    (response.status(), Json(ErrorBody::new(detail))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::missing_field("title").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(anyhow::anyhow!("disk on fire")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::missing_field("style").to_string(),
            "Missing 'style' in request body"
        );
        assert_eq!(ApiError::NotFound.to_string(), "Article does not exist");
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ErrorBody::new("nope")).unwrap();
        assert_eq!(body, serde_json::json!({ "error": { "message": "nope" } }));
    }

    #[test]
    fn test_internal_error_carries_detail() {
        let response = ApiError::from(anyhow::anyhow!("disk on fire")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<InternalErrorDetail>().unwrap();
        assert_eq!(detail.0, "disk on fire");
    }

    #[test]
    fn test_client_errors_carry_no_detail() {
        let response = ApiError::NotFound.into_response();
        assert!(response.extensions().get::<InternalErrorDetail>().is_none());
    }
}
