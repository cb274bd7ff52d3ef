use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::crypto::{Address, Ed25519Signer};
use crate::reputation::engine::DEFAULT_TREE_CACHE_CAPACITY;

/// Configuration for the credit scoring service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Bundle signer configuration
    pub signer: SignerConfig,
    /// Scoring input configuration
    pub input: InputConfig,
    /// Engine tuning
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Mask values that look like secrets before they reach the logs
    pub sanitize_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Ed25519 secret key, hex encoded - MUST come from the environment
    #[serde(skip_serializing, default)]
    pub secret_key: String,
    /// Name the signer is registered under by bundle consumers
    pub entity_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// JSON file holding the user's canonical events
    pub events_path: Option<PathBuf>,
    /// Address being scored
    pub user_address: Option<String>,
    /// Evaluation time in unix seconds (defaults to now)
    pub as_of: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of cached Merkle trees (0 disables caching)
    pub tree_cache_capacity: usize,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                sanitize_logs: true,
            },
            signer: SignerConfig {
                secret_key: String::new(), // MUST be configured
                entity_id: "indexer".to_string(),
            },
            input: InputConfig::default(),
            engine: EngineConfig {
                tree_cache_capacity: DEFAULT_TREE_CACHE_CAPACITY,
            },
        }
    }
}

impl CreditConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = env::var("CHERT_CREDIT_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(sanitize) = env::var("CHERT_CREDIT_SANITIZE_LOGS") {
            config.logging.sanitize_logs = sanitize
                .parse()
                .context("Invalid CHERT_CREDIT_SANITIZE_LOGS value")?;
        }

        // Signer - SECURITY CRITICAL, never defaulted
        if let Ok(secret_key) = env::var("CHERT_CREDIT_SIGNER_KEY") {
            config.signer.secret_key = secret_key;
        }

        if let Ok(entity_id) = env::var("CHERT_CREDIT_SIGNER_ID") {
            config.signer.entity_id = entity_id;
        }

        if let Ok(path) = env::var("CHERT_CREDIT_EVENTS_PATH") {
            config.input.events_path = Some(PathBuf::from(path));
        }

        if let Ok(user) = env::var("CHERT_CREDIT_USER") {
            config.input.user_address = Some(user);
        }

        if let Ok(as_of) = env::var("CHERT_CREDIT_AS_OF") {
            config.input.as_of = Some(as_of.parse().context("Invalid CHERT_CREDIT_AS_OF value")?);
        }

        if let Ok(capacity) = env::var("CHERT_CREDIT_TREE_CACHE_CAPACITY") {
            config.engine.tree_cache_capacity = capacity
                .parse()
                .context("Invalid CHERT_CREDIT_TREE_CACHE_CAPACITY value")?;
        }

        config.validate()?;

        info!(
            "Configuration loaded: signer={}, cache_capacity={}",
            config.signer.entity_id, config.engine.tree_cache_capacity
        );

        Ok(config)
    }

    /// Validate configuration for a scoring run
    pub fn validate(&self) -> Result<()> {
        if self.signer.secret_key.is_empty() {
            return Err(anyhow::anyhow!(
                "CHERT_CREDIT_SIGNER_KEY must be set to a hex-encoded Ed25519 secret key"
            ));
        }

        Ed25519Signer::from_hex(&self.signer.secret_key)
            .map_err(|e| anyhow::anyhow!("Invalid signer key: {}", e))?;

        if self.input.events_path.is_none() {
            return Err(anyhow::anyhow!("CHERT_CREDIT_EVENTS_PATH must be set"));
        }

        let user = self
            .input
            .user_address
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("CHERT_CREDIT_USER must be set"))?;
        user.parse::<Address>()
            .with_context(|| format!("Invalid CHERT_CREDIT_USER value: {}", user))?;

        if let Some(as_of) = self.input.as_of {
            if as_of < 0 {
                return Err(anyhow::anyhow!("CHERT_CREDIT_AS_OF must not be negative"));
            }
            if Utc.timestamp_opt(as_of, 0).single().is_none() {
                return Err(anyhow::anyhow!(
                    "CHERT_CREDIT_AS_OF is out of range: {}",
                    as_of
                ));
            }
        }

        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => warn!("Unknown log level '{}', falling back to info", other),
        }

        Ok(())
    }

    /// Evaluation time for this run
    pub fn as_of(&self) -> DateTime<Utc> {
        self.input
            .as_of
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(Utc::now)
    }

    /// Build the signer; the key stays inside the returned value
    pub fn signer(&self) -> Result<Ed25519Signer> {
        Ed25519Signer::from_hex(&self.signer.secret_key)
            .map_err(|e| anyhow::anyhow!("Invalid signer key: {}", e))
    }
}

/// Sanitize sensitive data for logging
pub fn sanitize_for_logging(data: &str) -> String {
    let sensitive_patterns = ["key", "secret", "token", "password", "credential", "signer"];

    let data_lower = data.to_lowercase();
    let looks_like_raw_key = data.len() >= 64 && data.chars().all(|c| c.is_ascii_hexdigit());

    if looks_like_raw_key || sensitive_patterns.iter().any(|p| data_lower.contains(p)) {
        let chars: Vec<char> = data.chars().collect();
        // Show a little context but mask the middle
        let keep = if chars.len() > 20 { 6 } else { 2.min(chars.len()) };
        let head: String = chars[..keep].iter().collect();
        let tail: String = chars[chars.len().saturating_sub(keep)..].iter().collect();
        return format!("{}***{}", head, tail);
    }

    data.to_string()
}
