//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use reserve_life_extractor::ExtractorConfig;
use reserve_life_llm::perplexity::{
    DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS,
};
use reserve_life_llm::{LlmError, PerplexityProvider};
use reserve_life_sec::EdgarConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = ".reserve-life";
const CONFIG_FILE: &str = "config.toml";
const DATA_FILE: &str = "companies.json";
const MAX_LLM_RETRIES: u32 = 10;

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Company store
    #[serde(default)]
    pub store: StoreSettings,

    /// SEC EDGAR client
    #[serde(default)]
    pub sec: EdgarConfig,

    /// LLM provider
    #[serde(default)]
    pub llm: LlmSettings,

    /// Extraction pipeline
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Where companies and filings are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Store file; defaults to `companies.json` next to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// LLM provider settings. The API key is only read from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model name
    pub model: String,

    /// API base URL
    pub endpoint: String,

    /// Attempts per request
    pub max_retries: u32,

    /// Request timeout (seconds)
    pub timeout_secs: u64,

    /// Delay before the first retry (milliseconds)
    pub backoff_ms: u64,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load configuration from file, creating it with defaults if missing.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.sec
            .validate()
            .map_err(|e| CliError::Config(format!("[sec] {}", e)))?;
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("[extractor] {}", e)))?;
        if self.llm.model.trim().is_empty() {
            return Err(CliError::Config("[llm] model must not be empty".into()));
        }
        if self.llm.max_retries == 0 || self.llm.max_retries > MAX_LLM_RETRIES {
            return Err(CliError::Config(format!(
                "[llm] max_retries must be between 1 and {}",
                MAX_LLM_RETRIES
            )));
        }
        Ok(())
    }

    /// Store file for a config loaded from `config_path`.
    pub fn data_path(&self, config_path: &Path) -> PathBuf {
        match &self.store.path {
            Some(path) => path.clone(),
            None => config_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DATA_FILE),
        }
    }
}

impl LlmSettings {
    /// Build the provider; fails when `PERPLEXITY_API_KEY` is not set.
    pub fn provider(&self) -> std::result::Result<PerplexityProvider, LlmError> {
        PerplexityProvider::from_env()?
            .with_endpoint(self.endpoint.clone())
            .with_model(self.model.clone())
            .with_max_retries(self.max_retries)
            .with_backoff(Duration::from_millis(self.backoff_ms))
            .with_timeout(self.timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            backoff_ms: 1_000,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
