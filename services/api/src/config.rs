//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// Gemini's OpenAI-compatible endpoint.
pub const GEMINI_OPENAI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub api_key: String,
    /// `None` means the client library's default (OpenAI) endpoint.
    pub api_base: Option<String>,
    pub notes_model: String,
    pub vision_model: String,
    pub chat_model: String,
    pub max_image_bytes: usize,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // --- Load Server Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Provider Credentials ---
        // A Gemini key selects Gemini's OpenAI-compatible endpoint by default.
        let (api_key, default_base) = match (var("GEMINI_API_KEY"), var("OPENAI_API_KEY")) {
            (Some(key), _) => (key, Some(GEMINI_OPENAI_BASE.to_string())),
            (None, Some(key)) => (key, None),
            (None, None) => {
                return Err(ConfigError::MissingVar(
                    "GEMINI_API_KEY or OPENAI_API_KEY".to_string(),
                ))
            }
        };
        let api_base = var("AI_API_BASE").or(default_base);

        // --- Load Adapter-specific Settings ---
        let notes_model = var("NOTES_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string());
        let vision_model = var("VISION_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string());
        let chat_model = var("CHAT_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string());

        let max_image_bytes = match var("MAX_IMAGE_BYTES") {
            Some(raw) => raw.parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "MAX_IMAGE_BYTES".to_string(),
                    format!("'{}' is not a positive byte count", raw),
                )
            })?,
            None => 10 * 1024 * 1024,
        };

        let allowed_origin =
            var("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            log_level,
            api_key,
            api_base,
            notes_model,
            vision_model,
            chat_model,
            max_image_bytes,
            allowed_origin,
        })
    }
}
