use anyhow::{Context, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Engine configuration loaded from environment variables.
///
/// The backend base address is always configuration — never a hardcoded
/// constant — so the same build works against a local backend or a deployed
/// one.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the resume backend, e.g. `https://api.example.com`.
    pub api_base_url: String,
    /// Transport-level request timeout in seconds.
    pub request_timeout_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_base_url: require_env("API_BASE_URL")?,
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .context("REQUEST_TIMEOUT_SECS must be a number of seconds")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
