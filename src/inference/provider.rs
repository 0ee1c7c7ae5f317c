//! # Generative Provider Port
//!
//! The seam between the gateway and whichever hosted model API serves it.
//! The gateway only ever sees [`GenerativeClient`], so tests drive it with
//! scripted fakes and production wires in the Gemini client.

use async_trait::async_trait;

/// One piece of a content-generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    /// Binary payload, already base64-encoded.
    InlineData { mime_type: String, data: String },
    Text(String),
}

/// Provider-neutral description of a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCall {
    pub parts: Vec<ContentPart>,
    pub temperature: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered with a non-success HTTP status.
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("request failed: {0}")]
    Http(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("API key not configured")]
    MissingCredential,
}

#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Run one generation call against `model`. An `Ok` with empty text is a
    /// successful call that produced nothing; the gateway decides what that
    /// means.
    async fn generate(&self, model: &str, call: &GenerationCall) -> Result<String, ProviderError>;
}

const QUOTA_SIGNALS: [&str; 4] = ["429", "quota", "limit", "exhausted"];

/// True when `message` carries a quota or rate-limit signal.
pub fn message_signals_quota(message: &str) -> bool {
    let message = message.to_lowercase();
    QUOTA_SIGNALS.iter().any(|signal| message.contains(signal))
}

/// Decides whether a provider error is a quota/rate-limit failure.
///
/// A structured 429 status wins outright; otherwise the rendered message is
/// checked for quota wording, since providers often report quota problems
/// with other status codes.
pub fn is_quota_error(err: &ProviderError) -> bool {
    match err {
        ProviderError::Api { status: 429, .. } => true,
        other => message_signals_quota(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_signals_any_case() {
        assert!(message_signals_quota("HTTP 429 Too Many Requests"));
        assert!(message_signals_quota("Quota exceeded for metric"));
        assert!(message_signals_quota("RESOURCE_EXHAUSTED"));
        assert!(message_signals_quota("Rate LIMIT reached"));
        assert!(!message_signals_quota("model not found"));
    }

    #[test]
    fn test_structured_429_is_quota() {
        let err = ProviderError::Api {
            status: 429,
            message: "slow down".to_string(),
        };
        assert!(is_quota_error(&err));
    }

    #[test]
    fn test_other_errors_classified_by_message() {
        let not_found = ProviderError::Api {
            status: 404,
            message: "models/foo is not found".to_string(),
        };
        assert!(!is_quota_error(&not_found));

        let quota_as_400 = ProviderError::Api {
            status: 400,
            message: "quota exceeded".to_string(),
        };
        assert!(is_quota_error(&quota_as_400));

        assert!(!is_quota_error(&ProviderError::Http("connection reset".to_string())));
        assert!(!is_quota_error(&ProviderError::MissingCredential));
    }
}
