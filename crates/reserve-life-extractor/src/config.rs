//! Configuration for the Extractor

use reserve_life_domain::GenerationOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Keywords a filing block must mention to be sent to the LLM
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "proved reserves",
    "reserves",
    "production",
    "barrels",
    "bbl",
    "crude oil",
];

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Case-insensitive keywords used to select blocks
    pub keywords: Vec<String>,

    /// Maximum excerpt size sent to the LLM (characters)
    pub excerpt_budget: usize,

    /// Shortest paragraph considered (characters)
    pub min_paragraph_chars: usize,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum time for a single LLM call (seconds)
    pub extraction_timeout_secs: u64,
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Options passed to the LLM provider
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err("keywords must contain at least one non-empty keyword".to_string());
        }
        if self.excerpt_budget < 1_000 {
            return Err("excerpt_budget must be at least 1000".to_string());
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0 and 2".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            excerpt_budget: 24_000,
            min_paragraph_chars: 30,
            max_tokens: 500,
            temperature: 0.0,
            extraction_timeout_secs: 120,
        }
    }
}
