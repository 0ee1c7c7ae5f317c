//! # Gemini Client
//!
//! Calls `models/{model}:generateContent` on the Google Generative Language
//! API. One instance is built at startup and shared through `AppState`; it
//! holds no per-request state.

use super::types::{ApiErrorBody, GenerateContentRequest, GenerateContentResponse};
use crate::config::GeminiConfig;
use crate::inference::{GenerationCall, GenerativeClient, ProviderError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Http(format!("client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(
        config: &GeminiConfig,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        Self::new(
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, model: &str, call: &GenerationCall) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingCredential)?;
        let body = GenerateContentRequest::from(call);

        debug!(
            model = %model,
            parts = call.parts.len(),
            temperature = call.temperature,
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_api_error(&body, status.as_u16());
            warn!(model = %model, status = status.as_u16(), "Gemini API error");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let text = parsed.text();
        debug!(
            model = %model,
            chars = text.len(),
            finish_reason = parsed.finish_reason().unwrap_or("unknown"),
            "Gemini response received"
        );
        Ok(text)
    }
}

/// Pull a readable message out of an error body, keeping the status code
/// name (e.g. `RESOURCE_EXHAUSTED`) so quota classification can see it.
fn parse_api_error(body: &str, status: u16) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(code) => format!("{} ({})", parsed.error.message, code),
            None => parsed.error.message,
        },
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    }
}
