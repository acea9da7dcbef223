//! Reserve Life SEC Access
//!
//! Retrieval of filings from the SEC EDGAR archive:
//!
//! - ticker → CIK lookup via `ticker.txt`
//! - filing discovery on the company browse page
//! - period of report and primary document from the filing index page
//! - raw document download (implements `FilingSource`)
//!
//! All SEC requests share one [`RateLimiter`] (10 requests per second by
//! default) and retry with exponential backoff. Company names and prices
//! come from Yahoo Finance via [`EdgarClient::market_info`].

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod index;
pub mod market;
pub mod rate_limiter;

pub use client::EdgarClient;
pub use config::EdgarConfig;
pub use error::{Result, SecError};
pub use index::{FilingDetails, FilingListing};
pub use market::MarketInfo;
pub use rate_limiter::RateLimiter;
