//! Configuration for the EDGAR client

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for `max_attempts`
pub const MAX_ATTEMPTS: u32 = 10;

/// Configuration for [`crate::EdgarClient`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgarConfig {
    /// `User-Agent` sent to SEC; EDGAR asks for a contact address
    pub user_agent: String,

    /// Maximum SEC requests per second
    pub requests_per_second: u32,

    /// Attempts per document before giving up
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds); doubles each retry
    pub backoff_ms: u64,

    /// Timeout for a single request (seconds)
    pub timeout_secs: u64,

    /// Base URL of the SEC site
    pub base_url: String,

    /// Base URL of the market data service
    pub market_data_url: String,
}

impl EdgarConfig {
    /// Minimum spacing between SEC requests
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.requests_per_second.max(1)))
    }

    /// Delay before the first retry
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Timeout for a single request
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.user_agent.trim().is_empty() {
            return Err("user_agent must not be empty".to_string());
        }
        if self.requests_per_second == 0 || self.requests_per_second > 10 {
            return Err("requests_per_second must be between 1 and 10".to_string());
        }
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS {
            return Err(format!("max_attempts must be between 1 and {}", MAX_ATTEMPTS));
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if !self.base_url.starts_with("http") {
            return Err(format!("base_url is not an http(s) URL: {}", self.base_url));
        }
        Ok(())
    }
}

impl Default for EdgarConfig {
    fn default() -> Self {
        Self {
            user_agent: "reserve-life contact@example.com".to_string(),
            requests_per_second: 10,
            max_attempts: 3,
            backoff_ms: 500,
            timeout_secs: 15,
            base_url: "https://www.sec.gov".to_string(),
            market_data_url: "https://query1.finance.yahoo.com".to_string(),
        }
    }
}
