//! Application configuration loaded from environment variables.
//!
//! Secrets (JWT signing key, generative-language API key) are injected as
//! environment variables by the deployment platform and read once at
//! startup.

use std::env;

/// Default TTL for the stale-while-revalidate streak display cache.
const DEFAULT_STREAK_CACHE_TTL_SECS: i64 = 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Generative-language model used for food-text parsing
    pub genai_model: String,
    /// TTL for the streak display cache (seconds)
    pub streak_cache_ttl_secs: i64,

    // --- Secrets (injected as env vars) ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// API key for the generative-language endpoint
    pub genai_api_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            genai_model: env::var("GENAI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            streak_cache_ttl_secs: env::var("STREAK_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_STREAK_CACHE_TTL_SECS),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            genai_api_key: env::var("GENAI_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GENAI_API_KEY"))?,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            genai_model: "gemini-1.5-flash".to_string(),
            streak_cache_ttl_secs: DEFAULT_STREAK_CACHE_TTL_SECS,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            genai_api_key: "test_api_key".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
