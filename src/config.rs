use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub scorer: ScorerConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListenConfig {
    #[serde(default = "default_listen_address")]
    pub address: String,
    #[serde(default = "default_listen_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    /// Recipient that every x402 header must name (compared case-insensitively)
    #[serde(default = "default_payment_address")]
    pub address: String,
    /// Minimum amount in wei for one prediction
    #[serde(default = "default_rate_wei")]
    pub rate_wei: u64,
    #[serde(default = "default_header_name")]
    pub header_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScorerConfig {
    /// Chance of an unscheduled-maintenance bump on transit predictions (0.0 - 1.0)
    #[serde(default = "default_maintenance_probability")]
    pub maintenance_probability: f64,
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertsConfig {
    /// Limit used by /disruption-alerts when the caller gives none
    #[serde(default = "default_alert_limit")]
    pub default_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
            port: default_listen_port(),
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            address: default_payment_address(),
            rate_wei: default_rate_wei(),
            header_name: default_header_name(),
        }
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            maintenance_probability: default_maintenance_probability(),
            model_version: default_model_version(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self { default_limit: default_alert_limit() }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { cors: true }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_listen_address() -> String { "0.0.0.0".to_string() }
fn default_listen_port() -> u16 { 8000 }
fn default_payment_address() -> String { "0x742d35Cc6634C0532925a3b8d49D1dFA1aCdE9fE".to_string() }
fn default_rate_wei() -> u64 { 10_000_000_000_000_000 } // 0.01 ETH
fn default_header_name() -> String { "x402-micropayment".to_string() }
fn default_maintenance_probability() -> f64 { 0.1 }
fn default_model_version() -> String { "1.0.0".to_string() }
fn default_alert_limit() -> usize { 10 }

pub const DEFAULT_CONFIG_PATH: &str = "snapstake.toml";

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config '{}': {}", path, e))?;
        Ok(config)
    }

    /// Load from an explicit path, or from the default path if it exists.
    /// Only the default path may be absent; then built-in defaults apply.
    pub fn resolve(explicit: Option<&str>) -> anyhow::Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH)?,
            None => {
                info!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                Self::default()
            }
        };

        if let Ok(address) = std::env::var("PAYMENT_ADDRESS") {
            config.apply_payment_address(address);
        }
        Ok(config)
    }

    fn apply_payment_address(&mut self, address: String) {
        let address = address.trim();
        if !address.is_empty() {
            self.payment.address = address.to_string();
        }
    }
}
