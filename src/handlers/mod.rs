//! # HTTP Handlers
//!
//! ## Available Endpoints:
//! - `POST /api/transcribe` - base64 audio in, transcript out
//! - `POST /api/transcribe/upload` - multipart audio file in, transcript out
//! - `POST /api/translate` - text in, translation out
//! - `POST /api/export` - transcript as a downloadable `.txt`
//! - `GET /api/languages` - offered translation targets
//! - `GET|PUT /api/v1/config` - runtime configuration
//! - `GET /api/v1/health`, `GET /api/v1/metrics`, `GET /health`
//!
//! Inference endpoints answer any other method with a JSON 405.

pub mod config;
pub mod export;
pub mod transcribe;
pub mod translate;

use crate::error::{AppError, AppResult};
use crate::health;
use crate::inference::{
    CandidatePool, FailureReason, InferenceGateway, InferenceOutcome, InferenceRequest, ProgressLog,
};
use crate::state::AppState;
use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpRequest, HttpResponse, Resource, Route};
use tracing::debug;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health::health_check))
            .route("/metrics", web::get().to(health::detailed_metrics))
            .route("/config", web::get().to(config::get_config))
            .route("/config", web::put().to(config::update_config)),
    )
    .service(
        web::scope("/api")
            .service(post_only("/transcribe", web::post().to(transcribe::transcribe)))
            .service(post_only(
                "/transcribe/upload",
                web::post().to(transcribe::transcribe_upload),
            ))
            .service(post_only("/translate", web::post().to(translate::translate)))
            .service(post_only("/export", web::post().to(export::export_transcript)))
            .route("/languages", web::get().to(translate::languages)),
    )
    .route("/health", web::get().to(health::health_check));
}

fn post_only(path: &str, route: Route) -> Resource {
    web::resource(path)
        .route(route)
        .default_service(web::to(method_not_allowed))
}

async fn method_not_allowed() -> AppResult<HttpResponse> {
    Err(AppError::MethodNotAllowed)
}

/// App-wide fallback so unknown paths get the JSON error body too.
pub async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!(
        "No route for {} {}",
        req.method(),
        req.path()
    )))
}

/// JSON extractor settings: the size limit has to admit a full base64 audio
/// payload, and extractor failures use the same error body as everything else.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let app_err = match &err {
                JsonPayloadError::Overflow { .. }
                | JsonPayloadError::OverflowKnownLength { .. } => {
                    AppError::PayloadTooLarge(err.to_string())
                }
                _ => AppError::BadRequest(err.to_string()),
            };
            app_err.into()
        })
}

/// Text produced by a successful gateway run.
pub(crate) struct Completion {
    pub text: String,
    pub model_used: String,
}

/// Keeps the in-flight gauge right even if the request future is dropped.
struct InFlight<'a>(&'a AppState);

impl<'a> InFlight<'a> {
    fn start(state: &'a AppState) -> Self {
        state.begin_inference();
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.end_inference();
    }
}

/// Build a fresh pool for this request, run the gateway over it and turn a
/// failure outcome into the error body callers expect.
pub(crate) async fn run_gateway(
    state: &AppState,
    request: &InferenceRequest,
    progress: &ProgressLog,
) -> AppResult<Completion> {
    let config = state.get_config();
    let pool = CandidatePool::select(&config.models.candidates, config.models.pool_mode);
    let gateway = InferenceGateway::new(state.client.as_ref(), config.gateway_settings());
    debug!(
        order = ?pool.as_slice(),
        mode = config.models.pool_mode.as_str(),
        "Candidate order selected"
    );

    let report = {
        let _in_flight = InFlight::start(state);
        gateway.run(request, &pool, progress).await
    };
    state.record_attempts(&report.attempts);
    debug!(
        task = request.task(),
        success = report.outcome.is_success(),
        attempts = report.attempts.len(),
        "Gateway run finished"
    );

    match report.outcome {
        InferenceOutcome::Success { text, model_used } => Ok(Completion { text, model_used }),
        InferenceOutcome::Failure { reason, last_error } => {
            Err(failure_error(request, &pool, reason, last_error, progress.snapshot()))
        }
    }
}

fn failure_error(
    request: &InferenceRequest,
    pool: &CandidatePool,
    reason: FailureReason,
    last_error: Option<String>,
    progress: Vec<String>,
) -> AppError {
    let label = match request {
        InferenceRequest::Transcription { .. } => "Transcription",
        InferenceRequest::Translation { .. } => "Translation",
    };

    match reason {
        FailureReason::Exhausted => AppError::InferenceFailed {
            kind: "exhausted",
            message: format!("{} failed: all model candidates exhausted", label),
            details: if pool.is_empty() {
                "No model candidates are configured.".to_string()
            } else {
                format!(
                    "Tried {}. Please wait a few moments before retrying.",
                    pool
                )
            },
            raw: last_error,
            progress,
        },
        FailureReason::EmptyOutput { model } => AppError::InferenceFailed {
            kind: "empty_output",
            message: format!("{} failed: model output empty", label),
            details: format!("{} answered without any text.", model),
            raw: last_error,
            progress,
        },
    }
}
