use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Application configuration loaded from environment variables.
/// Built once in `main` and handed to whatever needs it through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub llm_timeout: Duration,
    pub upload_folder: PathBuf,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            google_api_key: require_env("GOOGLE_API_KEY")?,
            gemini_model: env_or("GEMINI_MODEL", DEFAULT_MODEL),
            gemini_api_base: env_or("GEMINI_API_BASE", DEFAULT_API_BASE),
            llm_timeout: Duration::from_secs(
                env_or("LLM_TIMEOUT_SECS", "120")
                    .parse::<u64>()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            upload_folder: PathBuf::from(env_or("UPLOAD_FOLDER", "uploads")),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", "1048576")
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            port: env_or("PORT", "5000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
impl Config {
    /// Config for tests: no network credentials, uploads under `upload_folder`.
    pub fn for_tests(upload_folder: PathBuf) -> Self {
        Config {
            google_api_key: "test-key".to_string(),
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_api_base: DEFAULT_API_BASE.to_string(),
            llm_timeout: Duration::from_secs(5),
            upload_folder,
            max_upload_bytes: 1024 * 1024,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
