//! Error types for SEC and market data access

use reserve_life_domain::Transient;
use thiserror::Error;

/// Errors that can occur talking to EDGAR or the market data service
#[derive(Error, Debug)]
pub enum SecError {
    /// Document could not be retrieved after every attempt
    #[error("Filing unavailable after {attempts} attempt(s): {url}: {reason}")]
    FilingUnavailable {
        /// Requested URL
        url: String,
        /// Attempts made
        attempts: u32,
        /// Last failure
        reason: String,
    },

    /// Ticker has no CIK in the SEC ticker list
    #[error("No CIK found for ticker: {0}")]
    UnknownTicker(String),

    /// Page did not have the expected structure
    #[error("Parse error: {0}")]
    Parse(String),

    /// Market data lookup failed
    #[error("Market data error: {0}")]
    MarketData(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Transient for SecError {
    fn is_transient(&self) -> bool {
        matches!(self, SecError::FilingUnavailable { .. })
    }
}

/// Result type for SEC operations
pub type Result<T> = std::result::Result<T, SecError>;
