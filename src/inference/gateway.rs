//! # Inference Gateway
//!
//! Walks a [`CandidatePool`] one model at a time until a model returns text.
//!
//! ## Rotation rules:
//! 1. Report "Attempting <model>" to the progress sink
//! 2. Issue exactly one generation call to that model
//! 3. Non-empty text: stop and return it, trimmed, with the serving model
//! 4. Quota/rate-limit error: warn and move on
//! 5. Any other error: log it and move on as well
//! 6. Empty text: stop or move on, per [`EmptyOutputPolicy`]
//! 7. Pool exhausted: fail with the last underlying error
//!
//! Attempts are strictly sequential and no candidate is retried, so a pool
//! of N candidates costs at most N calls.

use super::pool::CandidatePool;
use super::progress::ProgressReporter;
use super::prompts::build_call;
use super::provider::{is_quota_error, GenerativeClient};
use super::request::{FailureReason, InferenceOutcome, InferenceRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// What to do when a model answers successfully but with no text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyOutputPolicy {
    /// Stop and report "output empty".
    #[default]
    Terminal,
    /// Treat it like a failed attempt and try the next candidate.
    Advance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatewaySettings {
    pub empty_output: EmptyOutputPolicy,
    pub transcription_temperature: f64,
    pub translation_temperature: f64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            empty_output: EmptyOutputPolicy::Terminal,
            transcription_temperature: 0.0,
            translation_temperature: 0.1,
        }
    }
}

/// How a single candidate attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    Success,
    EmptyOutput,
    QuotaExceeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub model: String,
    pub result: AttemptResult,
}

/// The outcome plus the per-candidate trail that led to it.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReport {
    pub outcome: InferenceOutcome,
    pub attempts: Vec<AttemptRecord>,
}

pub struct InferenceGateway<'a> {
    client: &'a dyn GenerativeClient,
    settings: GatewaySettings,
}

impl<'a> InferenceGateway<'a> {
    pub fn new(client: &'a dyn GenerativeClient, settings: GatewaySettings) -> Self {
        Self { client, settings }
    }

    pub async fn run(
        &self,
        request: &InferenceRequest,
        pool: &CandidatePool,
        progress: &dyn ProgressReporter,
    ) -> GatewayReport {
        let call = build_call(
            request,
            self.settings.transcription_temperature,
            self.settings.translation_temperature,
        );
        let mut attempts = Vec::with_capacity(pool.len());
        let mut last_error: Option<String> = None;

        info!(task = request.task(), pool = %pool, "Starting candidate rotation");

        for (index, model) in pool.iter().enumerate() {
            progress.report(&format!("Attempting {}", model));
            debug!(
                task = request.task(),
                model = %model,
                attempt = index + 1,
                pool_size = pool.len(),
                "Attempting candidate"
            );

            match self.client.generate(model, &call).await {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        info!(
                            task = request.task(),
                            model = %model,
                            chars = text.len(),
                            "Candidate succeeded"
                        );
                        attempts.push(AttemptRecord {
                            model: model.to_string(),
                            result: AttemptResult::Success,
                        });
                        return GatewayReport {
                            outcome: InferenceOutcome::Success {
                                text: text.to_string(),
                                model_used: model.to_string(),
                            },
                            attempts,
                        };
                    }

                    warn!(task = request.task(), model = %model, "Candidate returned empty output");
                    attempts.push(AttemptRecord {
                        model: model.to_string(),
                        result: AttemptResult::EmptyOutput,
                    });

                    match self.settings.empty_output {
                        EmptyOutputPolicy::Terminal => {
                            return GatewayReport {
                                outcome: InferenceOutcome::Failure {
                                    reason: FailureReason::EmptyOutput {
                                        model: model.to_string(),
                                    },
                                    last_error,
                                },
                                attempts,
                            };
                        }
                        EmptyOutputPolicy::Advance => {
                            last_error = Some(format!("{} returned empty output", model));
                        }
                    }
                }
                Err(err) => {
                    let result = if is_quota_error(&err) {
                        warn!(
                            task = request.task(),
                            model = %model,
                            error = %err,
                            "Quota hit, rotating to next candidate"
                        );
                        AttemptResult::QuotaExceeded
                    } else {
                        error!(
                            task = request.task(),
                            model = %model,
                            error = %err,
                            "Candidate failed"
                        );
                        AttemptResult::Failed
                    };
                    attempts.push(AttemptRecord {
                        model: model.to_string(),
                        result,
                    });
                    last_error = Some(err.to_string());
                }
            }
        }

        error!(task = request.task(), attempts = attempts.len(), "All candidates exhausted");
        GatewayReport {
            outcome: InferenceOutcome::Failure {
                reason: FailureReason::Exhausted,
                last_error,
            },
            attempts,
        }
    }
}
