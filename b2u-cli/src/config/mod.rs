//! Configuration module for b2u-checkout.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;

use crate::config::file::FileConfig;
use b2u_core::config::{FlowConfig, PollSettings, TrustPolicy};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable holding the bearer token for the wallet API.
pub const ACCESS_TOKEN_ENV: &str = "B2U_ACCESS_TOKEN";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub base_url: Url,
    pub wallet_id: String,
    pub flow: FlowConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    backend_override: Option<Url>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, backend_override: Option<Url>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            backend_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the flow configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    fn load_str(&self, config_content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(config_content)?;

        if let Some(backend) = &self.backend_override {
            file_config.backend.base_url = backend.clone();
        }

        validate(&file_config)?;
        Ok(build_loaded_config(file_config))
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let base_url = &config.backend.base_url;
    if !matches!(base_url.scheme(), "http" | "https") || base_url.host_str().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "backend base_url {base_url} must be an http(s) URL with a host"
        )));
    }
    if config.backend.wallet_id.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "backend wallet_id must not be empty".to_string(),
        ));
    }

    let verification = &config.verification;
    if verification.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "verification interval_secs must be greater than zero".to_string(),
        ));
    }
    if verification.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "verification max_attempts must be greater than zero".to_string(),
        ));
    }
    if verification.amount_tolerance < 0 {
        return Err(ConfigError::ValidationError(
            "verification amount_tolerance must not be negative".to_string(),
        ));
    }
    if verification.page_limit == 0 {
        return Err(ConfigError::ValidationError(
            "verification page_limit must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    let FileConfig {
        backend,
        trust,
        verification,
    } = file_config;

    // The backend's own host always reports outcomes.
    let mut policy = trust
        .trusted_hosts
        .iter()
        .fold(TrustPolicy::for_backend(&backend.base_url), |policy, host| {
            policy.with_trusted_host(host)
        });
    if let Some(loopback_hosts) = trust.loopback_hosts {
        policy = policy.with_loopback_hosts(loopback_hosts);
    }

    let flow = FlowConfig {
        trust: policy,
        poll: PollSettings {
            interval: Duration::from_secs(verification.interval_secs),
            max_attempts: verification.max_attempts,
            amount_tolerance: Decimal::from(verification.amount_tolerance),
        },
        success_page_delay: Duration::from_millis(verification.success_page_delay_ms),
        wallet_type: verification.wallet_type,
        page_limit: verification.page_limit,
    };

    LoadedConfig {
        base_url: backend.base_url,
        wallet_id: backend.wallet_id,
        flow,
    }
}

/// Get the API access token from the environment, if any.
pub fn get_access_token() -> Option<String> {
    std::env::var(ACCESS_TOKEN_ENV)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
