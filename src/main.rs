//! Application entry point for the `solarcast` backend service.
//!
//! This binary orchestrates the full startup sequence for the solar power
//! prediction API, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Fetching the model artifact on first start if it is not on disk
//! - Loading the model once and sharing it read-only across requests
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `MODEL_PATH` (optional) – model artifact location
//! - `MODEL_URL` (optional) – download source when the artifact is missing
//! - `PORT` / `BIND_ADDR` (optional) – listen address (default: `0.0.0.0:8080`)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config` for the request-handling options.
//!
//! This module follows the Explicit Module Boundary Pattern (EMBP) by
//! delegating artifact handling to `artifact`, configuration parsing to
//! `config`, and route registration to `routes`.
use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

mod artifact;
mod config;
mod extract;
mod models;
mod prediction;
mod predictor;
mod routes;

pub use config::Config;

// These are not used here but they are imported to be used by routes/*.rs, that way
// refactoring is easier since routes/*.rs do not have knowledge of the modules
// behind them, only of their parent module (main.rs)
pub use models::PredictRequest;
pub use predictor::SharedPredictor;

/// State shared by every route: the load-once model and the configuration.
pub type AppState = (SharedPredictor, Config);

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    artifact::ensure_artifact(&cfg.model_path, cfg.model_url.as_deref()).await?;

    tracing::info!("Loading model from {:?}", cfg.model_path);
    let model_path = cfg.model_path.clone();
    let predictor = tokio::task::spawn_blocking(move || predictor::ForestPredictor::load(&model_path))
        .await
        .map_err(|e| anyhow::anyhow!("Model loading task failed: {}", e))??;
    let predictor: SharedPredictor = Arc::new(predictor);

    // Build app from routes gateway (EMBP)
    let addr = SocketAddr::new(cfg.bind_addr, cfg.port);
    let app: Router = routes::router(predictor, cfg);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `AXUM_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `AXUM_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked. It installs the subscriber globally
/// for the lifetime of the process.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to AXUM_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AXUM_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=info,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
