//! # Inference Requests and Outcomes
//!
//! The two kinds of work the gateway accepts (transcription and translation)
//! and the single terminal result it produces for each request.

use std::fmt;

/// A unit of work for the gateway.
///
/// ## Invariants:
/// - Constructed only through [`InferenceRequest::transcription`] or
///   [`InferenceRequest::translation`], which reject blank fields
/// - Immutable once built; every candidate attempt sees the same payload
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceRequest {
    /// Base64 audio plus its MIME type.
    Transcription {
        audio_base64: String,
        mime_type: String,
    },
    /// Source text plus the human-readable name of the target language.
    Translation {
        text: String,
        target_language: String,
    },
}

/// Raised when a request is missing one of its required fields.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("Missing audio data or mime type")]
    MissingAudio,
    #[error("Missing text or target language")]
    MissingText,
}

impl InferenceRequest {
    pub fn transcription(
        audio_base64: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<Self, RequestError> {
        let audio_base64 = audio_base64.into();
        let mime_type = mime_type.into().trim().to_string();

        if audio_base64.trim().is_empty() || mime_type.is_empty() {
            return Err(RequestError::MissingAudio);
        }

        Ok(Self::Transcription {
            audio_base64,
            mime_type,
        })
    }

    pub fn translation(
        text: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Result<Self, RequestError> {
        let text = text.into();
        let target_language = target_language.into().trim().to_string();

        if text.trim().is_empty() || target_language.is_empty() {
            return Err(RequestError::MissingText);
        }

        Ok(Self::Translation {
            text,
            target_language,
        })
    }

    /// Short task name used in logs and error messages.
    pub fn task(&self) -> &'static str {
        match self {
            Self::Transcription { .. } => "transcription",
            Self::Translation { .. } => "translation",
        }
    }
}

/// Why a request ended without text.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Every candidate in the pool was tried and none produced text.
    Exhausted,
    /// A candidate answered successfully but with no text, and the
    /// configured policy treats that as terminal.
    EmptyOutput { model: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Exhausted => write!(f, "all candidates exhausted"),
            FailureReason::EmptyOutput { model } => write!(f, "output empty from {}", model),
        }
    }
}

/// The terminal result of one request: exactly one of these is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    Success {
        text: String,
        model_used: String,
    },
    Failure {
        reason: FailureReason,
        last_error: Option<String>,
    },
}

impl InferenceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InferenceOutcome::Success { .. })
    }
}
