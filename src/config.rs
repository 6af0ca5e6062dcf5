use crate::domains::report::types::ImpactTargets;
use crate::errors::{ServiceError, ServiceResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_API_URL: &str = "MNE_API_URL";
pub const ENV_API_KEY: &str = "MNE_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "MNE_TIMEOUT_SECS";
pub const ENV_ORGANIZATION: &str = "MNE_ORGANIZATION";
pub const ENV_CURRENCY: &str = "MNE_CURRENCY";

/// Dakar
const DEFAULT_MAP_CENTER: [f64; 2] = [14.7167, -17.4667];
const DEFAULT_MAP_ZOOM: u8 = 7;

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Remote data API endpoint and credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    /// `[latitude, longitude]`
    pub center: [f64; 2],
    pub zoom: u8,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center: DEFAULT_MAP_CENTER,
            zoom: DEFAULT_MAP_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    pub organization: String,
    pub currency: String,
    #[serde(default)]
    pub impact_targets: ImpactTargets,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            organization: "M&E Console".to_string(),
            currency: "FCFA".to_string(),
            impact_targets: ImpactTargets::default(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiSettings,
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub report: ReportSettings,
}

impl AppConfig {
    /// Read configuration from the process environment, after loading a
    /// `.env` file if one is present. Missing values stay empty and are
    /// reported by `validate`.
    pub fn from_env() -> Self {
        if dotenv::dotenv().is_ok() {
            debug!("Loaded variables from .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, over the defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(&lookup);
        config
    }

    /// Load a JSON file; environment values take precedence over it
    pub fn from_json_file(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let mut config: AppConfig = serde_json::from_str(&text).map_err(|e| {
            ServiceError::Configuration(format!("Invalid configuration file {}: {}", path.display(), e))
        })?;
        config.apply_overrides(&|key: &str| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = value(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(key) = value(ENV_API_KEY) {
            self.api.api_key = key;
        }
        if let Some(timeout) = value(ENV_TIMEOUT_SECS) {
            match timeout.parse::<u64>() {
                Ok(secs) if secs > 0 => self.api.timeout_secs = secs,
                _ => warn!("Ignoring invalid {}={}", ENV_TIMEOUT_SECS, timeout),
            }
        }
        if let Some(organization) = value(ENV_ORGANIZATION) {
            self.report.organization = organization;
        }
        if let Some(currency) = value(ENV_CURRENCY) {
            self.report.currency = currency;
        }
    }

    /// Reject missing or placeholder credentials
    pub fn validate(&self) -> ServiceResult<()> {
        if is_placeholder(&self.api.base_url) {
            return Err(ServiceError::Configuration(format!(
                "API URL is not configured (set {})",
                ENV_API_URL
            )));
        }
        if !(self.api.base_url.starts_with("https://") || self.api.base_url.starts_with("http://")) {
            return Err(ServiceError::Configuration(format!(
                "API URL must start with http:// or https://, got '{}'",
                self.api.base_url
            )));
        }
        if is_placeholder(&self.api.api_key) {
            return Err(ServiceError::Configuration(format!(
                "API key is not configured (set {})",
                ENV_API_KEY
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(ServiceError::Configuration("Timeout must be positive".to_string()));
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Empty, or a template value such as `YOUR_API_URL` or `<api-key>`
fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value.to_uppercase().contains("YOUR_")
        || (value.starts_with('<') && value.ends_with('>'))
}
