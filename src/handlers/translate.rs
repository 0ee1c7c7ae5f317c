use super::run_gateway;
use crate::error::AppResult;
use crate::inference::prompts::SUPPORTED_LANGUAGES;
use crate::inference::{InferenceRequest, ProgressLog, ProgressReporter};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: Option<String>,
    pub target_language: Option<String>,
}

/// `POST /api/translate`: `{ "text", "targetLanguage" }` to
/// `{ "translated", "modelUsed", "progress" }`.
///
/// Languages outside [`SUPPORTED_LANGUAGES`] are passed through as-is.
pub async fn translate(
    state: web::Data<AppState>,
    body: web::Json<TranslateRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let request = InferenceRequest::translation(
        body.text.unwrap_or_default(),
        body.target_language.unwrap_or_default(),
    )?;

    let progress = ProgressLog::new();
    if let InferenceRequest::Translation {
        text,
        target_language,
    } = &request
    {
        info!(target_language = %target_language, chars = text.len(), "Translation requested");
        progress.report(&format!("Synthesizing {} translation", target_language));
    }

    let completion = run_gateway(&state, &request, &progress).await?;

    Ok(HttpResponse::Ok().json(json!({
        "translated": completion.text,
        "modelUsed": completion.model_used,
        "progress": progress.snapshot()
    })))
}

pub async fn languages() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "languages": SUPPORTED_LANGUAGES }))
}
