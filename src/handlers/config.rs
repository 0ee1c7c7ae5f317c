use crate::{error::AppError, state::AppState};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ConfigQuery {
    pub format: Option<String>,
}

/// `GET /api/v1/config`, as JSON or, with `?format=toml`, as a `config.toml`
/// ready to drop next to the binary.
pub async fn get_config(
    state: web::Data<AppState>,
    query: web::Query<ConfigQuery>,
) -> Result<HttpResponse, AppError> {
    let config = state.get_config();

    match query.format.as_deref() {
        Some("toml") => {
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| AppError::Internal(format!("TOML serialization error: {}", e)))?;
            Ok(HttpResponse::Ok()
                .content_type("application/toml")
                .body(rendered))
        }
        None | Some("json") => Ok(HttpResponse::Ok().json(json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "config": config
        }))),
        Some(other) => Err(AppError::BadRequest(format!(
            "Unsupported config format: {}",
            other
        ))),
    }
}

pub async fn update_config(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    let json_str = serde_json::to_string(&body.into_inner())?;

    let mut current_config = state.get_config();
    current_config
        .update_from_json(&json_str)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    state
        .update_config(current_config.clone())
        .map_err(AppError::ValidationError)?;

    info!(
        candidates = ?current_config.models.candidates,
        pool_mode = current_config.models.pool_mode.as_str(),
        "Configuration updated"
    );

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Configuration updated successfully",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "updated_config": current_config
    })))
}
