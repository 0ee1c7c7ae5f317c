//! # Health & Metrics Endpoints
//!
//! - `GET /health` and `GET /api/v1/health`: liveness plus a summary of the
//!   candidate pool and credential status
//! - `GET /api/v1/metrics`: per-endpoint and per-model counters
//!
//! A missing API key does not make the service unhealthy; it is reported as
//! `degraded` so that a probe still sees the process as up.

use crate::config::AppConfig;
use crate::state::{AppMetrics, AppState};
use actix_web::{web, HttpResponse};
use serde_json::json;
use std::process;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let config = state.get_config();
    let uptime_seconds = state.get_uptime_seconds();

    let status = if state.credential_configured {
        "healthy"
    } else {
        "degraded"
    };

    HttpResponse::Ok().json(json!({
        "status": status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "service": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "host": config.server.host,
            "port": config.server.port
        },
        "metrics": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": overall_error_rate(&metrics),
            "in_flight_inferences": metrics.in_flight_inferences
        },
        "memory": get_memory_info(),
        "gateway": {
            "candidates": config.models.candidates,
            "pool_mode": config.models.pool_mode.as_str(),
            "empty_output": config.models.empty_output,
            "credential_configured": state.credential_configured
        },
        "system": get_system_status(&config, &metrics)
    }))
}

pub async fn detailed_metrics(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let uptime_seconds = state.get_uptime_seconds();

    let mut endpoint_stats: Vec<_> = metrics
        .endpoint_metrics
        .iter()
        .map(|(endpoint, metric)| {
            json!({
                "endpoint": endpoint,
                "request_count": metric.request_count,
                "error_count": metric.error_count,
                "error_rate": metric.error_rate(),
                "average_duration_ms": metric.average_duration_ms(),
                "total_duration_ms": metric.total_duration_ms
            })
        })
        .collect();
    endpoint_stats.sort_by(|a, b| a["endpoint"].as_str().cmp(&b["endpoint"].as_str()));

    let mut model_stats: Vec<_> = metrics
        .model_metrics
        .iter()
        .map(|(model, metric)| {
            json!({
                "model": model,
                "attempts": metric.attempts,
                "successes": metric.successes,
                "quota_hits": metric.quota_hits,
                "failures": metric.failures,
                "empty_outputs": metric.empty_outputs,
                "quota_rate": metric.quota_rate()
            })
        })
        .collect();
    model_stats.sort_by(|a, b| a["model"].as_str().cmp(&b["model"].as_str()));

    HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "overall": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": overall_error_rate(&metrics),
            "in_flight_inferences": metrics.in_flight_inferences,
            "requests_per_second": if uptime_seconds > 0 {
                metrics.request_count as f64 / uptime_seconds as f64
            } else {
                0.0
            }
        },
        "endpoints": endpoint_stats,
        "models": model_stats,
        "memory": get_memory_info()
    }))
}

fn overall_error_rate(metrics: &AppMetrics) -> f64 {
    if metrics.request_count > 0 {
        metrics.error_count as f64 / metrics.request_count as f64
    } else {
        0.0
    }
}

fn get_memory_info() -> serde_json::Value {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string(format!("/proc/{}/status", process::id())) {
            let read_kb = |prefix: &str| {
                status
                    .lines()
                    .find(|line| line.starts_with(prefix))
                    .and_then(|line| line.split_whitespace().nth(1))
                    .and_then(|kb| kb.parse::<u64>().ok())
                    .unwrap_or(0)
                    * 1024
            };

            return json!({
                "resident_memory_bytes": read_kb("VmRSS:"),
                "virtual_memory_bytes": read_kb("VmSize:"),
                "available": true
            });
        }
    }

    json!({
        "resident_memory_bytes": 0,
        "virtual_memory_bytes": 0,
        "available": false,
        "note": format!("Memory info not available for pid {}", process::id())
    })
}

/// Load summary. Every quota hit means a user waited on an extra provider
/// round trip, so a high share of them is flagged.
fn get_system_status(config: &AppConfig, metrics: &AppMetrics) -> serde_json::Value {
    let (attempts, quota_hits) = metrics
        .model_metrics
        .values()
        .fold((0u64, 0u64), |(a, q), m| (a + m.attempts, q + m.quota_hits));
    let quota_share = if attempts > 0 {
        quota_hits as f64 / attempts as f64
    } else {
        0.0
    };

    let status = if quota_share > 0.5 {
        "quota_pressure"
    } else if quota_share > 0.2 {
        "moderate_load"
    } else {
        "normal"
    };

    let mut warnings = Vec::new();
    if quota_share > 0.5 {
        warnings.push("Most attempts hit provider quota - consider adding model candidates");
    }
    if config.models.candidates.len() == 1 {
        warnings.push("Single model candidate - no fallback available on quota errors");
    }

    json!({
        "status": status,
        "quota_hit_percent": (quota_share * 100.0).round(),
        "total_attempts": attempts,
        "candidate_count": config.models.candidates.len(),
        "load_warnings": warnings
    })
}
