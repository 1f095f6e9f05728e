/// Error types for video-browser-service
///
/// Storage and signing failures degrade inside the handlers and never reach
/// this type. What does reach it becomes a plain-text error response.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::templates::TemplateError;

/// Result type for request handlers
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Page could not be rendered
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        tracing::error!(error = %self, "Request failed");

        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body("Internal Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_error_maps_to_500() {
        let err = AppError::Template(TemplateError::Missing("index.html"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("index.html"));
    }

    #[test]
    fn test_response_hides_details() {
        let err = AppError::from(TemplateError::Missing("play.html"));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
