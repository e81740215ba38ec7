//! Configuration management.
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! file, and `PUBFETCH_*` environment variables (`__` separates sections,
//! e.g. `PUBFETCH_FETCHER__BATCH_SIZE=2`).

mod file_config;

pub use file_config::ConfigFileError;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetcher::FetchOptions;
use crate::sources::{CSL_JSON_MEDIA_TYPE, DOI_ORG_BASE};
use crate::utils::{validate_resolver_base, RetryConfig, DEFAULT_USER_AGENT};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PUBFETCH";

/// File name looked up by [`find_config_file`]
pub const CONFIG_FILE_NAME: &str = "pubfetch.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Batching, pacing and retry settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Resolver endpoint and request identity
    #[serde(default)]
    pub http: HttpConfig,

    /// Where the DOI list lives
    #[serde(default)]
    pub input: InputConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fetcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetcherConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause after each successful fetch
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Pause between batches
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Retries allowed for a rate-limited DOI
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear backoff unit
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            request_delay_ms: default_request_delay_ms(),
            batch_delay_ms: default_batch_delay_ms(),
            max_retries: default_max_retries(),
            backoff_step_ms: default_backoff_step_ms(),
        }
    }
}

fn default_batch_size() -> usize {
    3
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_batch_delay_ms() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_step_ms() -> u64 {
    5000
}

/// HTTP configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_resolver_base")]
    pub resolver_base: String,

    /// Sent as `User-Agent`; include a contact address for the resolver's polite pool
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Sent as `Accept`
    #[serde(default = "default_accept")]
    pub accept: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            resolver_base: default_resolver_base(),
            user_agent: default_user_agent(),
            accept: default_accept(),
        }
    }
}

fn default_resolver_base() -> String {
    DOI_ORG_BASE.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_accept() -> String {
    CSL_JSON_MEDIA_TYPE.to_string()
}

/// Input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// JSON array of DOI strings
    #[serde(default = "default_doi_list")]
    pub doi_list: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            doi_list: default_doi_list(),
        }
    }
}

fn default_doi_list() -> PathBuf {
    PathBuf::from("src/contents/publications/publication_doi.json")
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for structured output, anything else for plain text
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Check values that serde defaults cannot rule out
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        if self.fetcher.batch_size == 0 {
            return Err(ConfigFileError::Invalid(
                "fetcher.batch_size must be at least 1".to_string(),
            ));
        }
        validate_resolver_base(&self.http.resolver_base)
            .map_err(|e| ConfigFileError::Invalid(format!("http.resolver_base: {}", e)))?;
        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigFileError::Invalid(
                "http.user_agent must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Runtime options for [`crate::fetcher::BibliographyFetcher`]
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            batch_size: self.fetcher.batch_size,
            request_delay: Duration::from_millis(self.fetcher.request_delay_ms),
            batch_delay: Duration::from_millis(self.fetcher.batch_delay_ms),
            retry: RetryConfig {
                max_retries: self.fetcher.max_retries,
                backoff_step: Duration::from_millis(self.fetcher.backoff_step_ms),
            },
        }
    }

    /// Whether logs should be emitted as JSON
    pub fn json_logs(&self) -> bool {
        self.logging
            .format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigFileError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Get the configuration from defaults and environment variables only
pub fn get_config() -> Result<Config, ConfigFileError> {
    let settings = config::Config::builder().add_source(environment()).build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Look for `pubfetch.toml` in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_in(&cwd, dirs::config_dir().as_deref())
}

/// Config lookup against explicit directories
fn find_config_file_in(cwd: &Path, config_dir: Option<&Path>) -> Option<PathBuf> {
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    config_dir
        .map(|dir| dir.join("pubfetch").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Serializes tests that read or write `PUBFETCH_*` variables
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
