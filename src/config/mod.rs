//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::fetch::{CredentialSource, EnvSecretStore, FetcherConfig, FileSecretStore};
use crate::models::PlatformRegion;
use crate::riot::{ClientOptions, DEFAULT_HOST_TEMPLATE, DEFAULT_MAX_MATCH_IDS, MAX_PAGE_SIZE};

/// Longest look-back accepted for match history, in 30-day months.
pub const MAX_MONTHS_BACK: u32 = 120;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Riot API access and request policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiotConfig {
    /// Default platform region, e.g. "na1"
    #[serde(default = "default_region")]
    pub region: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Read the key from this file instead (`{"api_key": "..."}` or bare key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_file: Option<PathBuf>,

    /// Base URL with a `{host}` placeholder
    #[serde(default = "default_host_template")]
    pub host_template: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_min_request_interval")]
    pub min_request_interval_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_circuit_cooldown")]
    pub circuit_cooldown_seconds: u64,

    /// Used when a 429 has no usable Retry-After header
    #[serde(default = "default_retry_after")]
    pub default_retry_after_seconds: u64,

    /// How long a key read from the environment or a file is trusted
    #[serde(default = "default_credential_ttl")]
    pub credential_ttl_seconds: u64,
}

fn default_region() -> String {
    "na1".to_string()
}

fn default_api_key_env() -> String {
    "RIOT_API_KEY".to_string()
}

fn default_host_template() -> String {
    DEFAULT_HOST_TEMPLATE.to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_min_request_interval() -> u64 {
    1200
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1000
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_circuit_cooldown() -> u64 {
    60
}

fn default_retry_after() -> u64 {
    60
}

fn default_credential_ttl() -> u64 {
    300
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            api_key_env: default_api_key_env(),
            api_key_file: None,
            host_template: default_host_template(),
            timeout_seconds: default_timeout(),
            min_request_interval_ms: default_min_request_interval(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            failure_threshold: default_failure_threshold(),
            circuit_cooldown_seconds: default_circuit_cooldown(),
            default_retry_after_seconds: default_retry_after(),
            credential_ttl_seconds: default_credential_ttl(),
        }
    }
}

impl RiotConfig {
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            timeout: Duration::from_secs(self.timeout_seconds),
            min_request_interval: Duration::from_millis(self.min_request_interval_ms),
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            failure_threshold: self.failure_threshold,
            circuit_cooldown: Duration::from_secs(self.circuit_cooldown_seconds),
            default_retry_after: Duration::from_secs(self.default_retry_after_seconds),
            ..FetcherConfig::default()
        }
    }

    /// Where the API key is read from: the key file when set, otherwise the
    /// environment variable.
    pub fn credential_source(&self) -> CredentialSource {
        match &self.api_key_file {
            Some(path) => CredentialSource::Store {
                store: Arc::new(FileSecretStore::new()),
                secret_id: path.display().to_string(),
            },
            None => CredentialSource::Store {
                store: Arc::new(EnvSecretStore),
                secret_id: self.api_key_env.clone(),
            },
        }
    }

    pub fn credential_ttl(&self) -> Duration {
        Duration::from_secs(self.credential_ttl_seconds)
    }
}

/// Match history collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Look-back window, in 30-day months
    #[serde(default = "default_months_back")]
    pub months_back: u32,

    /// Ids requested per page (1-100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Stop listing after this many match ids
    #[serde(default = "default_max_match_ids")]
    pub max_match_ids: usize,

    /// Fetch details for at most this many matches; unset means all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_match_details: Option<usize>,

    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,

    #[serde(default = "default_detail_fetch_delay")]
    pub detail_fetch_delay_ms: u64,
}

fn default_months_back() -> u32 {
    12
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_max_match_ids() -> usize {
    DEFAULT_MAX_MATCH_IDS
}

fn default_detail_concurrency() -> usize {
    1
}

fn default_detail_fetch_delay() -> u64 {
    100
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            months_back: default_months_back(),
            page_size: default_page_size(),
            max_match_ids: default_max_match_ids(),
            max_match_details: None,
            detail_concurrency: default_detail_concurrency(),
            detail_fetch_delay_ms: default_detail_fetch_delay(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub riot: RiotConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            riot: RiotConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Default region as a typed code.
    pub fn region(&self) -> Result<PlatformRegion, ConfigError> {
        self.riot.region.parse().map_err(|_| {
            ConfigError::ValidationError(format!("Unsupported region: {}", self.riot.region))
        })
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            host_template: self.riot.host_template.clone(),
            page_size: self.history.page_size,
            max_match_ids: self.history.max_match_ids,
            max_match_details: self.history.max_match_details,
            detail_concurrency: self.history.detail_concurrency,
            detail_fetch_delay: Duration::from_millis(self.history.detail_fetch_delay_ms),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.region()?;

        let sample = self.riot.host_template.replace("{host}", "americas");
        if Url::parse(&sample).is_err() {
            return Err(invalid(format!(
                "host_template does not produce a valid URL: {}",
                self.riot.host_template
            )));
        }

        if self.riot.timeout_seconds == 0 {
            return Err(invalid("Riot timeout must be greater than 0"));
        }

        if self.riot.max_attempts == 0 {
            return Err(invalid("max_attempts must be at least 1"));
        }

        if self.riot.failure_threshold == 0 {
            return Err(invalid("failure_threshold must be at least 1"));
        }

        if self.riot.api_key_file.is_none() && self.riot.api_key_env.trim().is_empty() {
            return Err(invalid("api_key_env must name an environment variable"));
        }

        if !(1..=MAX_MONTHS_BACK).contains(&self.history.months_back) {
            return Err(invalid(format!(
                "months_back must be between 1 and {}",
                MAX_MONTHS_BACK
            )));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.history.page_size) {
            return Err(invalid(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if self.history.max_match_ids == 0 {
            return Err(invalid("max_match_ids must be at least 1"));
        }

        if self.history.max_match_details == Some(0) {
            return Err(invalid("max_match_details must be at least 1 when set"));
        }

        if self.history.detail_concurrency == 0 {
            return Err(invalid("detail_concurrency must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.riot.region, "na1");
        assert_eq!(config.riot.api_key_env, "RIOT_API_KEY");
        assert_eq!(config.history.months_back, 12);
        assert_eq!(config.history.max_match_ids, 1000);
        assert_eq!(config.history.max_match_details, None);
    }

    #[test]
    fn test_fetcher_config_from_riot_section() {
        let riot = RiotConfig {
            min_request_interval_ms: 500,
            failure_threshold: 7,
            ..RiotConfig::default()
        };
        let fetcher = riot.fetcher_config();

        assert_eq!(fetcher.timeout, Duration::from_secs(10));
        assert_eq!(fetcher.min_request_interval, Duration::from_millis(500));
        assert_eq!(fetcher.max_attempts, 3);
        assert_eq!(fetcher.backoff_base, Duration::from_secs(1));
        assert_eq!(fetcher.failure_threshold, 7);
        assert_eq!(fetcher.circuit_cooldown, Duration::from_secs(60));
        assert_eq!(fetcher.default_retry_after, Duration::from_secs(60));
    }

    #[test]
    fn test_client_options_from_history_section() {
        let mut config = AppConfig::default();
        config.history.max_match_details = Some(20);
        config.history.detail_concurrency = 4;

        let options = config.client_options();
        assert_eq!(options.page_size, 100);
        assert_eq!(options.max_match_details, Some(20));
        assert_eq!(options.detail_concurrency, 4);
        assert_eq!(options.detail_fetch_delay, Duration::from_millis(100));
        assert_eq!(options.host_template, DEFAULT_HOST_TEMPLATE);
    }

    #[test]
    fn test_credential_source_selection() {
        let mut riot = RiotConfig::default();
        match riot.credential_source() {
            CredentialSource::Store { store, secret_id } => {
                assert_eq!(store.name(), "env");
                assert_eq!(secret_id, "RIOT_API_KEY");
            }
            CredentialSource::Static(_) => panic!("expected store"),
        }

        riot.api_key_file = Some(PathBuf::from("/secrets/riot.json"));
        match riot.credential_source() {
            CredentialSource::Store { store, secret_id } => {
                assert_eq!(store.name(), "file");
                assert_eq!(secret_id, "/secrets/riot.json");
            }
            CredentialSource::Static(_) => panic!("expected store"),
        }
    }

    #[test]
    fn test_config_validation_ok() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_failures() {
        let cases: Vec<fn(&mut AppConfig)> = vec![
            |c| c.riot.region = "moon1".to_string(),
            |c| c.riot.host_template = "not a url {host}".to_string(),
            |c| c.riot.timeout_seconds = 0,
            |c| c.riot.max_attempts = 0,
            |c| c.riot.failure_threshold = 0,
            |c| c.riot.api_key_env = " ".to_string(),
            |c| c.history.months_back = 0,
            |c| c.history.months_back = MAX_MONTHS_BACK + 1,
            |c| c.history.months_back = 10_000_000,
            |c| c.history.page_size = 0,
            |c| c.history.page_size = 101,
            |c| c.history.max_match_ids = 0,
            |c| c.history.max_match_details = Some(0),
            |c| c.history.detail_concurrency = 0,
        ];

        for (i, mutate) in cases.into_iter().enumerate() {
            let mut config = AppConfig::default();
            mutate(&mut config);
            assert!(config.validate().is_err(), "case {} should fail", i);
        }
    }

    #[test]
    fn test_from_file_partial_sections() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("riot-recap.toml");
        std::fs::write(
            &path,
            r#"
log_level = "debug"

[riot]
region = "EUW1"
min_request_interval_ms = 50

[history]
months_back = 3
max_match_details = 20
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.region().unwrap(), PlatformRegion::Euw1);
        assert_eq!(config.riot.min_request_interval_ms, 50);
        assert_eq!(config.riot.max_attempts, 3);
        assert_eq!(config.history.months_back, 3);
        assert_eq!(config.history.max_match_details, Some(20));
        assert_eq!(config.history.page_size, 100);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[history]\npage_size = 500\n").unwrap();

        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.riot.host_template, parsed.riot.host_template);
    }
}
