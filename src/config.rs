//! Configuration loader for the `solarcast` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::{env, net::IpAddr, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};

/// Parse an optional environment variable through its `FromStr` impl,
/// falling back to a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional boolean flag (`1|true|yes|on`, `0|false|no|off`).
macro_rules! parse_env_bool {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name).ok().as_deref() {
            None => $default,
            Some(v) => parse_flag(v).ok_or_else(|| anyhow!("Invalid {}: {:?}", $var_name, v))?,
        }
    };
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---

/// How free text is turned into a feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionStrategy {
    /// First four numbers in order of appearance.
    #[default]
    Positional,
    /// One label- or unit-anchored pattern per field.
    Labeled,
}

impl FromStr for ExtractionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positional" => Ok(Self::Positional),
            "labeled" | "labelled" => Ok(Self::Labeled),
            other => Err(format!("unknown extraction strategy '{other}'")),
        }
    }
}

/// Shape of a successful prediction in the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// `{"prediction": 512.35}`
    #[default]
    Number,
    /// `{"prediction": "Predicted power output: 512.35 W/m²"}`
    Formatted,
}

impl FromStr for OutputStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" | "numeric" => Ok(Self::Number),
            "formatted" | "text" => Ok(Self::Formatted),
            other => Err(format!("unknown output style '{other}'")),
        }
    }
}

/// Per-request policy consulted by the prediction handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionSettings {
    pub strategy: ExtractionStrategy,
    pub validate_ranges: bool,
    pub output_style: OutputStyle,
    /// Report failures with 4xx/5xx instead of an in-band 200.
    pub strict_status: bool,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::Positional,
            validate_ranges: true,
            output_style: OutputStyle::Number,
            strict_status: false,
        }
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Local path of the model artifact.
    pub model_path: PathBuf,

    /// Where to fetch the artifact from when `model_path` does not exist.
    pub model_url: Option<String>,

    /// Interface the HTTP server binds to.
    pub bind_addr: IpAddr,

    /// Port the HTTP server listens on.
    pub port: u16,

    pub prediction: PredictionSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("solar_power_model.json"),
            model_url: None,
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            prediction: PredictionSettings::default(),
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `MODEL_PATH` – model artifact location (default: `solar_power_model.json`)
/// - `MODEL_URL` – download source used when the artifact is missing
/// - `BIND_ADDR` – listen address (default: `0.0.0.0`)
/// - `PORT` – listen port (default: 8080)
/// - `EXTRACTION_STRATEGY` – `positional` or `labeled` (default: `positional`)
/// - `RANGE_VALIDATION` – enforce physical ranges (default: true)
/// - `OUTPUT_STYLE` – `number` or `formatted` (default: `number`)
/// - `STRICT_STATUS` – non-200 status codes on failure (default: false)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let defaults = Config::default();

    let model_path = env::var("MODEL_PATH")
        .map(PathBuf::from)
        .unwrap_or(defaults.model_path);
    let model_url = env::var("MODEL_URL").ok().filter(|url| !url.trim().is_empty());
    let bind_addr = parse_env!("BIND_ADDR", IpAddr, defaults.bind_addr);
    let port = parse_env!("PORT", u16, defaults.port);

    let prediction = PredictionSettings {
        strategy: parse_env!(
            "EXTRACTION_STRATEGY",
            ExtractionStrategy,
            ExtractionStrategy::default()
        ),
        validate_ranges: parse_env_bool!("RANGE_VALIDATION", true),
        output_style: parse_env!("OUTPUT_STYLE", OutputStyle, OutputStyle::default()),
        strict_status: parse_env_bool!("STRICT_STATUS", false),
    };

    Ok(Config {
        model_path,
        model_url,
        bind_addr,
        port,
        prediction,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Strips the query string from the model URL since download links
    /// often carry access tokens there.
    pub fn log_config(&self) {
        // ---
        let masked_url = match &self.model_url {
            Some(url) => match url.split_once('?') {
                Some((base, _)) => format!("{base}?****"),
                None => url.clone(),
            },
            None => "<unset>".to_string(),
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  MODEL_PATH          : {}", self.model_path.display());
        tracing::info!("  MODEL_URL           : {}", masked_url);
        tracing::info!("  BIND_ADDR           : {}", self.bind_addr);
        tracing::info!("  PORT                : {}", self.port);
        tracing::info!("  EXTRACTION_STRATEGY : {:?}", self.prediction.strategy);
        tracing::info!("  RANGE_VALIDATION    : {}", self.prediction.validate_ranges);
        tracing::info!("  OUTPUT_STYLE        : {:?}", self.prediction.output_style);
        tracing::info!("  STRICT_STATUS       : {}", self.prediction.strict_status);
    }
}
