//! # Configuration Management
//!
//! Loads gateway configuration from several sources, highest priority last:
//! 1. Default values (the `Default` impl below)
//! 2. `config.toml` in the working directory, if present
//! 3. Environment variables with the `APP_` prefix (e.g. `APP_SERVER_PORT`)
//! 4. Bare `HOST` / `PORT`, as set by most deployment platforms
//!
//! The provider API key is deliberately not part of [`AppConfig`]: it comes
//! only from the environment (`API_KEY`, then `GEMINI_API_KEY`) and is never
//! serialized back out through the config endpoints.

use crate::inference::{EmptyOutputPolicy, GatewaySettings, PoolMode};
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;

/// Default candidate pool, most capable first.
pub const DEFAULT_CANDIDATES: [&str; 3] = [
    "gemini-3-pro-preview",
    "gemini-3-flash-preview",
    "gemini-flash-lite-latest",
];

/// 100 MiB of raw audio.
pub const DEFAULT_MAX_AUDIO_BYTES: usize = 100 * 1024 * 1024;

/// Hard upper bound for `limits.max_audio_bytes`. The JSON extractor is sized
/// from this once at startup; the configured limit is checked per request.
pub const MAX_AUDIO_BYTES_CEILING: usize = 512 * 1024 * 1024;

/// Sections whose values are only read while the server starts.
const RESTART_ONLY_SECTIONS: [&str; 2] = ["server", "gemini"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub gemini: GeminiConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Candidate pool and per-task generation settings.
///
/// ## Fields:
/// - `candidates`: model identifiers eligible for each request
/// - `pool_mode`: `priority` keeps the order above, `shuffle` permutes it
///   per request to spread quota usage
/// - `empty_output`: `terminal` stops on an empty answer, `advance` tries the
///   next candidate
/// - `*_temperature`: sampling temperature per task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub candidates: Vec<String>,
    pub pool_mode: PoolMode,
    pub empty_output: EmptyOutputPolicy,
    pub transcription_temperature: f64,
    pub translation_temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_audio_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            models: ModelsConfig {
                candidates: DEFAULT_CANDIDATES.iter().map(|m| m.to_string()).collect(),
                pool_mode: PoolMode::Shuffle,
                empty_output: EmptyOutputPolicy::Terminal,
                transcription_temperature: 0.0,
                translation_temperature: 0.1,
            },
            gemini: GeminiConfig {
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                request_timeout_secs: 120,
            },
            limits: LimitsConfig {
                max_audio_bytes: DEFAULT_MAX_AUDIO_BYTES,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, `config.toml` and the environment.
    ///
    /// Field names contain underscores themselves, so nested keys are split
    /// on a double underscore.
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER__PORT=3000`
    /// - `APP_MODELS__POOL_MODE=priority`
    /// - `APP_MODELS__CANDIDATES=gemini-3-flash-preview,gemini-flash-lite-latest`
    /// - `APP_GEMINI__BASE_URL=http://localhost:9090/v1beta`
    /// - `PORT=3000`
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("models.candidates")
                    .try_parsing(true),
            );

        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Reject configurations the gateway cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.models.candidates.is_empty() {
            return Err(anyhow::anyhow!("At least one model candidate is required"));
        }

        if self.models.candidates.iter().any(|m| m.trim().is_empty()) {
            return Err(anyhow::anyhow!("Model candidate names cannot be blank"));
        }

        for (task, temperature) in [
            ("transcription", self.models.transcription_temperature),
            ("translation", self.models.translation_temperature),
        ] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(anyhow::anyhow!(
                    "{} temperature must be between 0 and 2, got {}",
                    task,
                    temperature
                ));
            }
        }

        if self.gemini.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Request timeout must be greater than 0"));
        }

        if self.limits.max_audio_bytes == 0 {
            return Err(anyhow::anyhow!("Audio size limit must be greater than 0"));
        }

        if self.limits.max_audio_bytes > MAX_AUDIO_BYTES_CEILING {
            return Err(anyhow::anyhow!(
                "Audio size limit cannot exceed {} bytes",
                MAX_AUDIO_BYTES_CEILING
            ));
        }

        Ok(())
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            empty_output: self.models.empty_output,
            transcription_temperature: self.models.transcription_temperature,
            translation_temperature: self.models.translation_temperature,
        }
    }

    /// Largest JSON body the extractor admits: a base64 payload at the
    /// ceiling plus room for the surrounding fields. Independent of the
    /// runtime limit, which `limits.max_audio_bytes` enforces per request.
    pub fn json_body_ceiling() -> usize {
        crate::audio::encoded_len(MAX_AUDIO_BYTES_CEILING) + 64 * 1024
    }

    /// Apply a partial update such as `{"models": {"pool_mode": "priority"}}`.
    ///
    /// Only `models` and `limits` can change at runtime. `server` and
    /// `gemini` are read once at startup, so touching them is an error, as
    /// are unknown keys and values of the wrong type. The result is validated
    /// before it is kept.
    pub fn update_from_json(&mut self, json_str: &str) -> Result<()> {
        let partial: serde_json::Value = serde_json::from_str(json_str)?;
        let sections = partial
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("Configuration update must be a JSON object"))?;
        let mut updated = self.clone();

        for (section, values) in sections {
            if RESTART_ONLY_SECTIONS.contains(&section.as_str()) {
                return Err(anyhow::anyhow!(
                    "'{}' settings cannot change at runtime; edit config.toml and restart",
                    section
                ));
            }

            let values = values
                .as_object()
                .ok_or_else(|| anyhow::anyhow!("'{}' must be a JSON object", section))?;

            for (key, value) in values {
                match (section.as_str(), key.as_str()) {
                    ("models", "candidates") => {
                        updated.models.candidates = typed_value(section, key, value)?
                    }
                    ("models", "pool_mode") => {
                        let mode: String = typed_value(section, key, value)?;
                        updated.models.pool_mode = mode.parse().map_err(anyhow::Error::msg)?;
                    }
                    ("models", "empty_output") => {
                        updated.models.empty_output = typed_value(section, key, value)?
                    }
                    ("models", "transcription_temperature") => {
                        updated.models.transcription_temperature = typed_value(section, key, value)?
                    }
                    ("models", "translation_temperature") => {
                        updated.models.translation_temperature = typed_value(section, key, value)?
                    }
                    ("limits", "max_audio_bytes") => {
                        updated.limits.max_audio_bytes = typed_value(section, key, value)?
                    }
                    _ => {
                        return Err(anyhow::anyhow!(
                            "Unknown configuration key '{}.{}'",
                            section,
                            key
                        ))
                    }
                }
            }
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn typed_value<T: DeserializeOwned>(
    section: &str,
    key: &str,
    value: &serde_json::Value,
) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| anyhow::anyhow!("Invalid value for '{}.{}': {}", section, key, e))
}

/// The provider credential, from `API_KEY` or `GEMINI_API_KEY`.
pub fn api_key_from_env() -> Option<String> {
    ["API_KEY", "GEMINI_API_KEY"]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}
