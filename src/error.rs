//! # Error Handling
//!
//! Application errors and their HTTP rendering.
//!
//! ## Error Categories:
//! - **BadRequest / ValidationError**: the caller sent something unusable (400)
//! - **MethodNotAllowed**: wrong HTTP verb on an inference endpoint (405)
//! - **PayloadTooLarge**: audio over the configured limit (413)
//! - **NotFound**: unknown resource (404)
//! - **InferenceFailed**: every candidate failed, or one answered empty (500)
//! - **Internal / ConfigError**: server-side faults (500)
//!
//! ## JSON Response Format:
//! The client shows `error` as-is, so it is a flat, human-readable string:
//! ```json
//! {
//!   "error": "Transcription failed: all model candidates exhausted",
//!   "type": "exhausted",
//!   "details": "Tried gemini-3-pro-preview, gemini-3-flash-preview. Please wait ...",
//!   "raw": "provider returned 429: Resource has been exhausted (RESOURCE_EXHAUSTED)",
//!   "timestamp": "2025-01-01T12:00:00Z"
//! }
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Internal(String),
    BadRequest(String),
    NotFound(String),
    ConfigError(String),
    ValidationError(String),
    MethodNotAllowed,
    PayloadTooLarge(String),
    /// The gateway produced a failure outcome.
    InferenceFailed {
        kind: &'static str,
        message: String,
        details: String,
        raw: Option<String>,
        progress: Vec<String>,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::InferenceFailed { message, .. } => write!(f, "{}", message),
        }
    }
}

impl AppError {
    /// Machine-readable error type for the `type` field.
    fn error_type(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::ConfigError(_) => "config_error",
            AppError::ValidationError(_) => "validation_error",
            AppError::MethodNotAllowed => "method_not_allowed",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::InferenceFailed { kind, .. } => *kind,
        }
    }

    /// The user-facing message: the bare text without the category prefix.
    fn message(&self) -> String {
        match self {
            AppError::Internal(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::ConfigError(msg)
            | AppError::ValidationError(msg)
            | AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::MethodNotAllowed => "Method Not Allowed".to_string(),
            AppError::InferenceFailed { message, .. } => message.clone(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) | AppError::ConfigError(_) | AppError::InferenceFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "error": self.message(),
            "type": self.error_type(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        if let AppError::InferenceFailed {
            details,
            raw,
            progress,
            ..
        } = self
        {
            body["details"] = json!(details);
            body["progress"] = json!(progress);
            if let Some(raw) = raw {
                body["raw"] = json!(raw);
            }
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// JSON problems are almost always the caller's fault, so they map to 400.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<crate::audio::AudioError> for AppError {
    fn from(err: crate::audio::AudioError) -> Self {
        use crate::audio::AudioError;

        match err {
            AudioError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            AudioError::InvalidBase64(_) => AppError::ValidationError(err.to_string()),
            AudioError::Read(_) => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<crate::inference::request::RequestError> for AppError {
    fn from(err: crate::inference::request::RequestError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<crate::workflow::TransitionError> for AppError {
    fn from(err: crate::workflow::TransitionError) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_validation_error_is_flat_400() {
        let err = AppError::ValidationError("Missing audio data or mime type".to_string());
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing audio data or mime type");
        assert_eq!(body["type"], "validation_error");
        assert!(body.get("details").is_none());
    }

    #[actix_web::test]
    async fn test_method_not_allowed() {
        let (status, body) = body_json(AppError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method Not Allowed");
    }

    #[actix_web::test]
    async fn test_inference_failure_carries_details() {
        let (status, body) = body_json(AppError::InferenceFailed {
            kind: "exhausted",
            message: "Translation failed: all model candidates exhausted".to_string(),
            details: "Tried A, B.".to_string(),
            raw: Some("provider returned 429: quota".to_string()),
            progress: vec!["Attempting A".to_string(), "Attempting B".to_string()],
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["type"], "exhausted");
        assert_eq!(body["details"], "Tried A, B.");
        assert_eq!(body["raw"], "provider returned 429: quota");
        assert_eq!(body["progress"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_audio_error_mapping() {
        let err: AppError = crate::audio::AudioError::TooLarge { limit: 10 }.into();
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
