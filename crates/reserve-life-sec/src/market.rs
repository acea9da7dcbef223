//! Company name and share price from Yahoo Finance
//!
//! Lookups are best effort: callers log failures and carry on with the
//! ticker alone.

use crate::client::EdgarClient;
use crate::error::{Result, SecError};
use reserve_life_domain::Ticker;
use serde_json::Value;
use tracing::debug;

/// Market data for one ticker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketInfo {
    /// Long name, or the short name when no long name is published
    pub name: Option<String>,
    /// Latest regular-market price
    pub price: Option<f64>,
    /// Currency of `price`
    pub currency: Option<String>,
}

/// Read `chart.result[0].meta` from a v8 chart response
pub fn parse_chart(body: &str) -> Result<MarketInfo> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| SecError::MarketData(format!("invalid JSON: {}", e)))?;

    if let Some(description) = json["chart"]["error"]["description"].as_str() {
        return Err(SecError::MarketData(description.to_string()));
    }

    let meta = &json["chart"]["result"][0]["meta"];
    if !meta.is_object() {
        return Err(SecError::MarketData("response has no chart metadata".to_string()));
    }

    let text = |key: &str| {
        meta[key]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(MarketInfo {
        name: text("longName").or_else(|| text("shortName")),
        price: meta["regularMarketPrice"].as_f64(),
        currency: text("currency"),
    })
}

impl EdgarClient {
    /// Look up a ticker's name and current price
    ///
    /// Not rate limited or retried; this is not a SEC endpoint.
    pub async fn market_info(&self, ticker: &Ticker) -> Result<MarketInfo> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.config().market_data_url.trim_end_matches('/'),
            ticker
        );
        debug!(url = %url, "Fetching market data");

        let response = self
            .http()
            .get(&url)
            .send()
            .await
            .map_err(|e| SecError::MarketData(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SecError::MarketData(format!("failed to read body: {}", e)))?;
        if !status.is_success() && !body.contains("\"chart\"") {
            return Err(SecError::MarketData(format!("HTTP {}", status)));
        }
        parse_chart(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart() {
        let body = r#"{"chart":{"result":[{"meta":{"currency":"USD","symbol":"XOM",
            "regularMarketPrice":104.25,"longName":"Exxon Mobil Corporation",
            "shortName":"Exxon Mobil"}}],"error":null}}"#;
        let info = parse_chart(body).unwrap();
        assert_eq!(info.name.as_deref(), Some("Exxon Mobil Corporation"));
        assert_eq!(info.price, Some(104.25));
        assert_eq!(info.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_parse_chart_short_name_fallback() {
        let body = r#"{"chart":{"result":[{"meta":{"shortName":"Chevron"}}],"error":null}}"#;
        let info = parse_chart(body).unwrap();
        assert_eq!(info.name.as_deref(), Some("Chevron"));
        assert_eq!(info.price, None);
    }

    #[test]
    fn test_parse_chart_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse_chart(body), Err(SecError::MarketData(_))));
        assert!(parse_chart("not json").is_err());
    }
}
