//! TOML file configuration structures.
//!
//! These structs directly map to the `b2u-config.toml` file format.

use b2u_core::config::{
    DEFAULT_AMOUNT_TOLERANCE, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL,
    DEFAULT_SUCCESS_PAGE_DELAY,
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub trust: TrustConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
}

/// Wallet backend section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the Back2Use API (e.g., "https://api.back2use.vn").
    pub base_url: Url,
    /// Wallet that deposits are credited to.
    pub wallet_id: String,
}

/// Callback trust section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Hosts allowed to report a payment outcome, in addition to the backend host.
    /// Write `*.parent` to also admit subdomains of `parent`.
    #[serde(default)]
    pub trusted_hosts: Vec<String>,
    /// Hosts never loaded in the checkout browser. Defaults to the usual
    /// development loopback addresses.
    #[serde(default)]
    pub loopback_hosts: Option<Vec<String>>,
}

/// Verification poller section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Allowed ledger/request amount difference, in minor units.
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: i64,
    #[serde(default = "default_success_page_delay_ms")]
    pub success_page_delay_ms: u64,
    #[serde(default = "default_wallet_type")]
    pub wallet_type: String,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_attempts: default_max_attempts(),
            amount_tolerance: default_amount_tolerance(),
            success_page_delay_ms: default_success_page_delay_ms(),
            wallet_type: default_wallet_type(),
            page_limit: default_page_limit(),
        }
    }
}

fn default_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_amount_tolerance() -> i64 {
    DEFAULT_AMOUNT_TOLERANCE
}

fn default_success_page_delay_ms() -> u64 {
    DEFAULT_SUCCESS_PAGE_DELAY.as_millis() as u64
}

fn default_wallet_type() -> String {
    "customer".to_string()
}

fn default_page_limit() -> u32 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parsing() {
        let toml_str = r#"
[backend]
base_url = "https://api.back2use.vn"
wallet_id = "66f0c0ffee"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.base_url.host_str(), Some("api.back2use.vn"));
        assert_eq!(config.backend.wallet_id, "66f0c0ffee");
        assert!(config.trust.trusted_hosts.is_empty());
        assert!(config.trust.loopback_hosts.is_none());
        assert_eq!(config.verification.interval_secs, 3);
        assert_eq!(config.verification.max_attempts, 15);
        assert_eq!(config.verification.amount_tolerance, 100);
        assert_eq!(config.verification.success_page_delay_ms, 1500);
        assert_eq!(config.verification.wallet_type, "customer");
    }

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[backend]
base_url = "https://api.back2use.vn"
wallet_id = "66f0c0ffee"

[trust]
trusted_hosts = ["pay.back2use.vn"]
loopback_hosts = ["localhost"]

[verification]
interval_secs = 5
max_attempts = 10
amount_tolerance = 0
wallet_type = "business"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.trust.trusted_hosts, vec!["pay.back2use.vn"]);
        assert_eq!(
            config.trust.loopback_hosts,
            Some(vec!["localhost".to_string()])
        );
        assert_eq!(config.verification.interval_secs, 5);
        assert_eq!(config.verification.max_attempts, 10);
        assert_eq!(config.verification.amount_tolerance, 0);
        assert_eq!(config.verification.page_limit, 20);
        assert_eq!(config.verification.wallet_type, "business");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let toml_str = r#"
[backend]
base_url = "not a url"
wallet_id = "w"
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }
}
