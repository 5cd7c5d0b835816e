use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::{page_meta::MetadataError, youtube::FetchError};

/// Per-field validation messages, keyed by the form field name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(value)` when nothing was recorded, otherwise a `Validation` error.
    pub fn finish<T>(self, value: T) -> AppResult<T> {
        if self.is_empty() { Ok(value) } else { Err(AppError::Validation(self)) }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid YouTube URL format")]
    InvalidVideoId,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Not allowed")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Upstream service returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("Database error: {0}")]
    Persistence(#[from] sea_orm::DbErr),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::InvalidVideoId => {
                StatusCode::BAD_REQUEST
            },
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Upstream { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Persistence(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Message safe to show to the user. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Upstream { .. } => {
                "Service temporarily unavailable, please try again".to_string()
            },
            AppError::Persistence(_) => "Failed to save changes".to_string(),
            AppError::Unexpected(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidVideoId => AppError::InvalidVideoId,
            FetchError::Upstream { status } => AppError::Upstream { status },
            FetchError::MissingApiKey => {
                AppError::Upstream { status: StatusCode::SERVICE_UNAVAILABLE.as_u16() }
            },
            FetchError::Timeout => AppError::Timeout,
            FetchError::Request(e) => AppError::Unexpected(anyhow::Error::new(e)),
        }
    }
}

impl From<MetadataError> for AppError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::Timeout => AppError::Timeout,
            MetadataError::Request(e) => AppError::Unexpected(anyhow::Error::new(e)),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unexpected(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }

        let body = match &self {
            AppError::Validation(errors) => json!({
                "error": self.public_message(),
                "errors": errors,
            }),
            AppError::Persistence(_) => json!({
                "error": self.public_message(),
                "errors": { "general": [self.public_message()] },
            }),
            _ => json!({ "error": self.public_message() }),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn into_parts(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_lists_every_field() {
        let mut errors = FieldErrors::default();
        errors.add("url", "URL is required");
        errors.add("title", "Title is required");

        let (status, json) = into_parts(AppError::Validation(errors)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["errors"]["url"][0], "URL is required");
        assert_eq!(json["errors"]["title"][0], "Title is required");
    }

    #[tokio::test]
    async fn persistence_failure_is_a_structured_payload() {
        let err = AppError::Persistence(sea_orm::DbErr::Custom("disk full".into()));

        let (status, json) = into_parts(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["errors"]["general"][0], "Failed to save changes");
        assert!(!json.to_string().contains("disk full"));
    }

    #[tokio::test]
    async fn timeout_and_upstream_statuses() {
        let (status, _) = into_parts(AppError::Timeout).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);

        let (status, json) = into_parts(AppError::Upstream { status: 500 }).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "Service temporarily unavailable, please try again");
    }

    #[test]
    fn finish_passes_value_through_when_clean() {
        assert_eq!(FieldErrors::default().finish(7).ok(), Some(7));
    }
}
