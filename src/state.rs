//! # Application State Management
//!
//! State shared by every HTTP handler: the runtime-updatable configuration,
//! process-wide metrics and the provider client.
//!
//! ## Arc<RwLock<T>> Pattern
//! - **Arc**: every worker thread holds a handle to the same data
//! - **RwLock**: many concurrent readers or a single writer
//!
//! None of this is gateway state. Each inference request builds its own
//! candidate pool and keeps its own last error; the counters here are only
//! observed, never consulted when choosing a model.

use crate::config::AppConfig;
use crate::inference::{AttemptRecord, AttemptResult, GenerativeClient};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<AppConfig>>,
    pub metrics: Arc<RwLock<AppMetrics>>,
    /// Injected provider client; shared, but holds no per-request state.
    pub client: Arc<dyn GenerativeClient>,
    /// Whether a provider API key was found at startup.
    pub credential_configured: bool,
    pub start_time: Instant,
}

#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    pub request_count: u64,
    pub error_count: u64,
    /// Gateway runs currently in progress.
    pub in_flight_inferences: u32,
    /// Key: endpoint, e.g. "POST /api/transcribe"
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
    /// Key: model candidate name
    pub model_metrics: HashMap<String, ModelMetric>,
}

#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,
    pub total_duration_ms: u64,
    pub error_count: u64,
}

/// Per-candidate attempt counters.
#[derive(Debug, Default, Clone)]
pub struct ModelMetric {
    pub attempts: u64,
    pub successes: u64,
    pub quota_hits: u64,
    pub failures: u64,
    pub empty_outputs: u64,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        client: Arc<dyn GenerativeClient>,
        credential_configured: bool,
    ) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            client,
            credential_configured,
            start_time: Instant::now(),
        }
    }

    /// A copy of the current configuration; the lock is released on return.
    pub fn get_config(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the configuration if it validates.
    pub fn update_config(&self, new_config: AppConfig) -> Result<(), String> {
        new_config.validate().map_err(|e| e.to_string())?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = new_config;
        Ok(())
    }

    fn with_metrics<R>(&self, f: impl FnOnce(&mut AppMetrics) -> R) -> R {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut metrics)
    }

    pub fn increment_request_count(&self) {
        self.with_metrics(|m| m.request_count += 1);
    }

    pub fn increment_error_count(&self) {
        self.with_metrics(|m| m.error_count += 1);
    }

    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        self.with_metrics(|m| {
            let metric = m.endpoint_metrics.entry(endpoint.to_string()).or_default();
            metric.request_count += 1;
            metric.total_duration_ms += duration_ms;
            if is_error {
                metric.error_count += 1;
            }
        });
    }

    pub fn begin_inference(&self) {
        self.with_metrics(|m| m.in_flight_inferences += 1);
    }

    pub fn end_inference(&self) {
        self.with_metrics(|m| m.in_flight_inferences = m.in_flight_inferences.saturating_sub(1));
    }

    /// Fold one request's attempt trail into the per-model counters.
    pub fn record_attempts(&self, attempts: &[AttemptRecord]) {
        self.with_metrics(|m| {
            for attempt in attempts {
                let metric = m.model_metrics.entry(attempt.model.clone()).or_default();
                metric.attempts += 1;
                match attempt.result {
                    AttemptResult::Success => metric.successes += 1,
                    AttemptResult::QuotaExceeded => metric.quota_hits += 1,
                    AttemptResult::Failed => metric.failures += 1,
                    AttemptResult::EmptyOutput => metric.empty_outputs += 1,
                }
            }
        });
    }

    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl EndpointMetric {
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}

impl ModelMetric {
    /// Share of attempts that hit a quota or rate limit.
    pub fn quota_rate(&self) -> f64 {
        if self.attempts > 0 {
            self.quota_hits as f64 / self.attempts as f64
        } else {
            0.0
        }
    }
}
