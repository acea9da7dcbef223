//! Companies and their filings

use crate::extraction::{ExtractionResult, FailureKind};
use crate::ticker::Ticker;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SEC form type of a filing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilingType {
    /// Annual report (10-K)
    Annual,
    /// Quarterly report (10-Q)
    Quarterly,
    /// Any other form, kept verbatim
    Other(String),
}

impl FilingType {
    /// SEC form name
    pub fn as_str(&self) -> &str {
        match self {
            FilingType::Annual => "10-K",
            FilingType::Quarterly => "10-Q",
            FilingType::Other(form) => form,
        }
    }

    /// Parse an SEC form name (case-insensitive)
    pub fn parse(form: &str) -> Self {
        match form.trim().to_uppercase().as_str() {
            "10-K" => FilingType::Annual,
            "10-Q" => FilingType::Quarterly,
            other => FilingType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FilingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for FilingType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<FilingType> for String {
    fn from(value: FilingType) -> Self {
        value.as_str().to_string()
    }
}

/// A periodic SEC disclosure owned by one company
///
/// Everything except `extraction` is fixed once the filing is discovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filing {
    /// Accession number, e.g. `0000034088-24-000018`
    pub accession: String,

    /// Form type
    pub form: FilingType,

    /// End of the reporting period
    pub period_end: NaiveDate,

    /// Date the filing was submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filing_date: Option<NaiveDate>,

    /// URL of the primary document
    pub url: String,

    /// Latest extraction result, absent until extraction runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionResult>,
}

impl Filing {
    /// Create a filing with no extraction result
    pub fn new(
        accession: impl Into<String>,
        form: FilingType,
        period_end: NaiveDate,
        url: impl Into<String>,
    ) -> Self {
        Self {
            accession: accession.into(),
            form,
            period_end,
            filing_date: None,
            url: url.into(),
            extraction: None,
        }
    }

    /// Set the submission date
    pub fn with_filing_date(mut self, date: NaiveDate) -> Self {
        self.filing_date = Some(date);
        self
    }

    /// Attach an extraction result, replacing any previous one
    ///
    /// An `UpstreamUnavailable` failure does not replace an existing success.
    /// Returns whether the stored result changed.
    pub fn attach_extraction(&mut self, result: ExtractionResult) -> bool {
        let keeps_previous = result.failure_kind() == Some(FailureKind::UpstreamUnavailable)
            && self.extraction.as_ref().is_some_and(ExtractionResult::is_success);
        if keeps_previous {
            return false;
        }
        self.extraction = Some(result);
        true
    }
}

/// A tracked oil company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Unique ticker
    pub ticker: Ticker,

    /// Display name
    pub name: String,

    /// SEC central index key, 10 digits, once resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cik: Option<String>,

    /// Last known share price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    /// Currency of `price`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Filings ordered by period end, oldest first
    #[serde(default)]
    pub filings: Vec<Filing>,
}

impl Company {
    /// Create a company with no filings; the name defaults to the ticker
    pub fn new(ticker: Ticker, name: Option<String>) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| ticker.to_string());
        Self {
            ticker,
            name,
            cik: None,
            price: None,
            currency: None,
            filings: Vec::new(),
        }
    }

    /// Find a filing by accession number
    pub fn filing(&self, accession: &str) -> Option<&Filing> {
        self.filings.iter().find(|f| f.accession == accession)
    }

    /// Find a filing by accession number for update
    pub fn filing_mut(&mut self, accession: &str) -> Option<&mut Filing> {
        self.filings.iter_mut().find(|f| f.accession == accession)
    }

    /// Add a filing unless one with the same accession exists
    ///
    /// Returns whether the filing was added.
    pub fn insert_filing(&mut self, filing: Filing) -> bool {
        if self.filing(&filing.accession).is_some() {
            return false;
        }
        let position = self
            .filings
            .partition_point(|f| (f.period_end, &f.accession) <= (filing.period_end, &filing.accession));
        self.filings.insert(position, filing);
        true
    }
}
