//! # ScribeFlow Gateway - Main Application Entry Point
//!
//! HTTP front door for audio transcription and text translation. Every request
//! is served by walking a pool of generative model candidates and falling back
//! to the next one on quota or provider errors.
//!
//! ## Application Architecture:
//! - **inference**: candidate pool, fallback gateway, prompts, provider trait
//! - **gemini**: reqwest-based provider client
//! - **audio**: base64 encoding, upload limits, MIME handling
//! - **workflow**: job status state machine
//! - **config**: TOML file + environment configuration
//! - **state**: shared configuration, metrics and client
//! - **health**: health and metrics endpoints
//! - **middleware**: request logging and metrics
//! - **handlers**: HTTP request handlers
//! - **error**: error types and their JSON rendering

mod audio;
mod config;
mod error;
mod gemini;
mod handlers;
mod health;
mod inference;
mod middleware;
mod state;
mod workflow;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use config::AppConfig;
use gemini::GeminiClient;
use state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Set once SIGTERM or SIGINT arrives.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting scribeflow-gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);
    info!(
        candidates = ?config.models.candidates,
        pool_mode = config.models.pool_mode.as_str(),
        "Model candidate pool"
    );

    let client = GeminiClient::from_config(&config.gemini, config::api_key_from_env())?;
    let credential_configured = client.has_credential();
    if !credential_configured {
        warn!("No API_KEY or GEMINI_API_KEY set; every inference request will fail");
    }

    let app_state = AppState::new(config.clone(), Arc::new(client), credential_configured);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let json_limit = AppConfig::json_body_ceiling();

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(handlers::json_config(json_limit))
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::MetricsMiddleware)
            .wrap(middleware::RequestLogging)
            .configure(handlers::routes)
            .default_service(web::to(handlers::not_found))
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!("Server error: {}", e),
                Err(e) => error!("Server task error: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// `RUST_LOG` wins; otherwise debug for this crate and info for actix.
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scribeflow_gateway=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

fn setup_signal_handlers() {
    tokio::spawn(async {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    error!("Failed to install signal handlers: {}", e);
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

/// Polls the shutdown flag every 100ms.
async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
