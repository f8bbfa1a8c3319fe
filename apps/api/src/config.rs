use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::evaluation::config::EvaluationConfig;
use crate::integrity::scoring::IntegrityConfig;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub embedding_api_url: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub port: u16,
    pub rust_log: String,
    pub max_latency_seconds: f64,
    pub max_concurrent_similarity: usize,
    pub similarity_timeout_secs: u64,
    pub integrity_no_data_score: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            database_url: require_env("DATABASE_URL")?,
            embedding_api_url: std::env::var("EMBEDDING_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/embeddings".to_string()),
            embedding_api_key: require_env("EMBEDDING_API_KEY")?,
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_latency_seconds: env_or("MAX_LATENCY_SECONDS", 8.0)?,
            max_concurrent_similarity: env_or("MAX_CONCURRENT_SIMILARITY", 4)?,
            similarity_timeout_secs: env_or("SIMILARITY_TIMEOUT_SECS", 15)?,
            integrity_no_data_score: env_or("INTEGRITY_NO_DATA_SCORE", 1.0)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.max_latency_seconds.is_finite() && self.max_latency_seconds > 0.0,
            "MAX_LATENCY_SECONDS must be a positive number"
        );
        anyhow::ensure!(
            self.max_concurrent_similarity > 0,
            "MAX_CONCURRENT_SIMILARITY must be at least 1"
        );
        anyhow::ensure!(
            self.similarity_timeout_secs > 0,
            "SIMILARITY_TIMEOUT_SECS must be at least 1"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.integrity_no_data_score),
            "INTEGRITY_NO_DATA_SCORE must be within [0, 1]"
        );
        Ok(())
    }

    pub fn similarity_timeout(&self) -> Duration {
        Duration::from_secs(self.similarity_timeout_secs)
    }

    pub fn integrity_config(&self) -> IntegrityConfig {
        IntegrityConfig {
            no_data_score: self.integrity_no_data_score,
            ..IntegrityConfig::default()
        }
    }

    pub fn evaluation_config(&self) -> EvaluationConfig {
        EvaluationConfig {
            max_latency_seconds: self.max_latency_seconds,
            max_concurrent_similarity: self.max_concurrent_similarity,
            similarity_timeout: self.similarity_timeout(),
            ..EvaluationConfig::default()
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
