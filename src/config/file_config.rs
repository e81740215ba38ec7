//! Configuration file support.
//!
//! # Configuration File Format
//!
//! ```toml
//! [fetcher]
//! batch_size = 3
//! request_delay_ms = 1000
//! batch_delay_ms = 2000
//! max_retries = 5
//! backoff_step_ms = 5000
//!
//! [http]
//! resolver_base = "https://doi.org"
//! user_agent = "my-site (mailto:me@example.com)"
//! accept = "application/vnd.citationstyles.csl+json"
//!
//! [input]
//! doi_list = "src/contents/publications/publication_doi.json"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::Path;

use super::Config;

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
