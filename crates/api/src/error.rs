//! Error to HTTP response mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tally_db::RepositoryError;
use tally_shared::AppError;
use tracing::error;

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Failure inside a repository call.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Failure at the HTTP boundary itself.
    #[error(transparent)]
    App(#[from] AppError),
}

impl ApiError {
    /// Shorthand for a 400 response.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::App(AppError::Validation(message.into()))
    }

    fn parts(&self) -> (u16, &'static str, bool) {
        match self {
            Self::Repository(e) => (e.http_status_code(), e.error_code(), e.is_internal()),
            Self::App(e) => (e.status_code(), e.error_code(), e.is_internal()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, internal) = self.parts();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if internal {
            error!(error = %self, code, "Request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({
                "error": code.to_ascii_lowercase(),
                "message": message,
            })),
        )
            .into_response()
    }
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use sea_orm::DbErr;
    use uuid::Uuid;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let response =
            ApiError::from(RepositoryError::not_found("account", Uuid::nil())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_of(response).await;
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_database_error_hides_detail() {
        let response = ApiError::from(RepositoryError::Database(DbErr::Custom(
            "connection refused at 10.0.0.7".into(),
        )))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_validation_keeps_message() {
        let response = ApiError::validation("subtotal is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_of(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "Validation error: subtotal is required");
    }
}
