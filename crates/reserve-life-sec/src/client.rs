//! HTTP access to EDGAR
//!
//! Every SEC request passes through one [`RateLimiter`] and the same retry
//! policy: non-2xx or empty bodies are retried with exponential backoff and
//! finally reported as [`SecError::FilingUnavailable`].

use crate::config::EdgarConfig;
use crate::error::{Result, SecError};
use crate::index::{self, FilingDetails, FilingListing};
use crate::rate_limiter::RateLimiter;
use async_trait::async_trait;
use chrono::NaiveDate;
use reserve_life_domain::{Filing, FilingSource, FilingType, Ticker};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Client for the SEC EDGAR site
#[derive(Debug, Clone)]
pub struct EdgarClient {
    config: EdgarConfig,
    http: reqwest::Client,
    limiter: Arc<RateLimiter>,
}

impl EdgarClient {
    /// Create a client from a validated configuration
    pub fn new(config: EdgarConfig) -> Result<Self> {
        config.validate().map_err(SecError::Config)?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .gzip(true)
            .build()
            .map_err(|e| SecError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let limiter = Arc::new(RateLimiter::new(config.min_interval()));
        Ok(Self {
            config,
            http,
            limiter,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &EdgarConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// GET a SEC URL as text, rate limited and retried
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let reason = match self.try_get(url).await {
                Ok(body) => return Ok(body),
                Err(reason) => reason,
            };

            if attempts >= self.config.max_attempts {
                warn!(url, attempts, reason = %reason, "Giving up on SEC request");
                return Err(SecError::FilingUnavailable {
                    url: url.to_string(),
                    attempts,
                    reason,
                });
            }

            let delay = self
                .config
                .backoff()
                .saturating_mul(2u32.saturating_pow(attempts - 1));
            debug!(url, attempt = attempts, reason = %reason, delay_ms = delay.as_millis() as u64, "Retrying SEC request");
            tokio::time::sleep(delay).await;
        }
    }

    /// One attempt; the error is a human-readable reason
    async fn try_get(&self, url: &str) -> std::result::Result<String, String> {
        let _permit = self.limiter.acquire().await;
        debug!(url, "GET");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read body: {}", e))?;
        if body.trim().is_empty() {
            return Err("empty body".to_string());
        }
        Ok(body)
    }

    /// Look up a ticker's 10-digit CIK
    pub async fn cik_for_ticker(&self, ticker: &Ticker) -> Result<String> {
        let url = format!("{}/include/ticker.txt", self.base_url());
        let text = self.get_text(&url).await?;
        index::parse_ticker_list(&text, ticker)
            .ok_or_else(|| SecError::UnknownTicker(ticker.to_string()))
    }

    /// List filings of one form submitted within a date range
    pub async fn list_filings(
        &self,
        cik: &str,
        form: &FilingType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FilingListing>> {
        let url = format!(
            "{}/cgi-bin/browse-edgar?action=getcompany&CIK={}&type={}&count=100",
            self.base_url(),
            cik,
            form
        );
        let html = self.get_text(&url).await?;
        let listings = index::parse_browse_page(&html, form, start, end);
        debug!(cik, form = %form, count = listings.len(), "Listed filings");
        Ok(listings)
    }

    /// Resolve a filing's period of report and primary document
    pub async fn filing_details(
        &self,
        cik: &str,
        accession: &str,
        form: &FilingType,
    ) -> Result<FilingDetails> {
        let url = index::index_url(self.base_url(), cik, accession);
        let html = self.get_text(&url).await?;
        index::parse_index_page(&html, self.base_url(), cik, accession, form)
    }

    /// Discover filings of the given forms within a date range
    ///
    /// Filings whose index page cannot be read are skipped with a warning.
    /// Accessions in `known` are not looked up again.
    pub async fn discover_filings(
        &self,
        cik: &str,
        forms: &[FilingType],
        start: NaiveDate,
        end: NaiveDate,
        known: &HashSet<String>,
    ) -> Result<Vec<Filing>> {
        let mut seen = known.clone();
        let mut filings = Vec::new();

        for form in forms {
            for listing in self.list_filings(cik, form, start, end).await? {
                if !seen.insert(listing.accession.clone()) {
                    continue;
                }
                match self.filing_details(cik, &listing.accession, form).await {
                    Ok(details) => filings.push(
                        Filing::new(listing.accession, form.clone(), details.period_end, details.url)
                            .with_filing_date(listing.filing_date),
                    ),
                    Err(e) => warn!(accession = %listing.accession, error = %e, "Skipping filing"),
                }
            }
        }

        info!(cik, count = filings.len(), "Discovered new filings");
        Ok(filings)
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }
}

#[async_trait]
impl FilingSource for EdgarClient {
    type Error = SecError;

    async fn fetch_document(&self, url: &str) -> Result<String> {
        self.get_text(url).await
    }
}
