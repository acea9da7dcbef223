//! Ticker symbols

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange ticker symbol, normalized to upper case
///
/// Tickers are the unique key of a company in the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Parse and normalize a ticker
    ///
    /// # Examples
    ///
    /// ```
    /// use reserve_life_domain::Ticker;
    ///
    /// let ticker = Ticker::parse(" xom ").unwrap();
    /// assert_eq!(ticker.as_str(), "XOM");
    /// assert!(Ticker::parse("BAD TICKER").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, String> {
        let upper = input.trim().to_uppercase();
        if upper.is_empty() {
            return Err("Ticker cannot be empty".to_string());
        }
        if upper.len() > 10 {
            return Err(format!("Ticker too long: {}", input.trim()));
        }
        if !upper
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err(format!(
                "Ticker must contain only letters, digits, '-' or '.': {}",
                input.trim()
            ));
        }
        Ok(Ticker(upper))
    }

    /// Get the ticker as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Ticker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}
