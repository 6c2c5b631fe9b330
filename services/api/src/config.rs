//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which service answers counsellor prompts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CounsellorProvider {
    /// The remote backend's `POST /chat`.
    Backend,
    /// An OpenAI-compatible model called directly.
    OpenAi,
}

impl FromStr for CounsellorProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "backend" => Ok(Self::Backend),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("'{}' is not a known counsellor provider", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub backend_base_url: String,
    pub log_level: Level,
    pub allowed_origin: String,
    pub draft_timeout: Duration,
    pub draft_fallback_delay: Duration,
    pub analysis_delay: Duration,
    pub chat_timeout: Duration,
    pub catalog_timeout: Duration,
    pub session_idle_timeout: Duration,
    pub counsellor_provider: CounsellorProvider,
    pub openai_api_key: Option<String>,
    pub counsellor_model: String,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn millis_var(name: &str, default: u64) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(Duration::from_millis(default)),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3001");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin = var_or("ALLOWED_ORIGIN", "http://localhost:3000");

        // --- Remote Backend ---
        let backend_base_url = var_or("BACKEND_BASE_URL", "https://dream-uni-backend.onrender.com")
            .trim_end_matches('/')
            .to_string();
        if backend_base_url.is_empty() {
            return Err(ConfigError::MissingVar("BACKEND_BASE_URL".to_string()));
        }

        // --- Timing ---
        let draft_timeout = millis_var("DRAFT_TIMEOUT_MS", 8000)?;
        let draft_fallback_delay = millis_var("DRAFT_FALLBACK_DELAY_MS", 1000)?;
        let analysis_delay = millis_var("ANALYSIS_DELAY_MS", 2000)?;
        let chat_timeout = millis_var("CHAT_TIMEOUT_MS", 30_000)?;
        let catalog_timeout = millis_var("CATALOG_TIMEOUT_MS", 30_000)?;

        let idle_minutes_str = var_or("SESSION_IDLE_MINUTES", "60");
        let idle_minutes = idle_minutes_str.parse::<u64>().map_err(|e| {
            ConfigError::InvalidValue("SESSION_IDLE_MINUTES".to_string(), e.to_string())
        })?;
        let session_idle_timeout = Duration::from_secs(idle_minutes * 60);

        // --- Counsellor ---
        let counsellor_provider = var_or("COUNSELLOR_PROVIDER", "backend")
            .parse::<CounsellorProvider>()
            .map_err(|e| ConfigError::InvalidValue("COUNSELLOR_PROVIDER".to_string(), e))?;
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        if counsellor_provider == CounsellorProvider::OpenAi && openai_api_key.is_none() {
            return Err(ConfigError::MissingVar("OPENAI_API_KEY".to_string()));
        }
        let counsellor_model = var_or("COUNSELLOR_MODEL", "gpt-4o-mini");

        Ok(Self {
            bind_address,
            backend_base_url,
            log_level,
            allowed_origin,
            draft_timeout,
            draft_fallback_delay,
            analysis_delay,
            chat_timeout,
            catalog_timeout,
            session_idle_timeout,
            counsellor_provider,
            openai_api_key,
            counsellor_model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parsing_is_case_insensitive() {
        assert_eq!("Backend".parse::<CounsellorProvider>(), Ok(CounsellorProvider::Backend));
        assert_eq!("OPENAI".parse::<CounsellorProvider>(), Ok(CounsellorProvider::OpenAi));
        assert!("gemini".parse::<CounsellorProvider>().is_err());
    }
}
