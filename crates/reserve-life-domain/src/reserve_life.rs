//! Reserve life computation
//!
//! Reserve life is proved reserves divided by annual production, in years.
//! Data points are derived on demand and never persisted.

use crate::company::{Company, Filing, FilingType};
use crate::extraction::{ExtractionResult, FailureKind};
use crate::ticker::Ticker;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// One point of a company's reserve life trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReserveLifeDataPoint {
    /// Company ticker
    pub ticker: Ticker,
    /// End of the reporting period
    pub period_end: NaiveDate,
    /// Reserve life in years
    pub years: f64,
    /// Form the figures came from
    pub form: FilingType,
    /// Proved reserves in barrels
    pub reserves_barrels: f64,
    /// Annual production in barrels per year
    pub production_barrels_per_year: f64,
}

/// Why no reserve life could be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedReason {
    /// Extraction has not run for the filing
    NotExtracted,
    /// Extraction ran and failed
    ExtractionFailed(FailureKind),
    /// Production was zero
    ZeroProduction,
}

impl fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndefinedReason::NotExtracted => write!(f, "not extracted"),
            UndefinedReason::ExtractionFailed(kind) => write!(f, "extraction failed ({})", kind),
            UndefinedReason::ZeroProduction => write!(f, "zero production"),
        }
    }
}

/// Reserve life of one filing
#[derive(Debug, Clone, PartialEq)]
pub enum ReserveLife {
    /// A finite ratio
    Defined(ReserveLifeDataPoint),
    /// No ratio
    Undefined(UndefinedReason),
}

impl ReserveLife {
    /// The data point, if defined
    pub fn data_point(&self) -> Option<&ReserveLifeDataPoint> {
        match self {
            ReserveLife::Defined(point) => Some(point),
            ReserveLife::Undefined(_) => None,
        }
    }
}

/// Reserves over production, or `None` when production is zero
///
/// ```
/// use reserve_life_domain::reserve_life::ratio;
///
/// assert_eq!(ratio(1000.0, 100.0), Some(10.0));
/// assert_eq!(ratio(1000.0, 0.0), None);
/// ```
pub fn ratio(reserves_barrels: f64, production_barrels_per_year: f64) -> Option<f64> {
    if production_barrels_per_year <= 0.0 {
        return None;
    }
    let years = reserves_barrels / production_barrels_per_year;
    years.is_finite().then_some(years)
}

/// Compute reserve life from an extraction result
pub fn compute(
    result: &ExtractionResult,
    ticker: &Ticker,
    period_end: NaiveDate,
    form: &FilingType,
) -> ReserveLife {
    match result {
        ExtractionResult::Success {
            reserves_barrels,
            production_barrels_per_year,
            ..
        } => match ratio(*reserves_barrels, *production_barrels_per_year) {
            Some(years) => ReserveLife::Defined(ReserveLifeDataPoint {
                ticker: ticker.clone(),
                period_end,
                years,
                form: form.clone(),
                reserves_barrels: *reserves_barrels,
                production_barrels_per_year: *production_barrels_per_year,
            }),
            None => ReserveLife::Undefined(UndefinedReason::ZeroProduction),
        },
        ExtractionResult::Failure { kind, .. } => {
            ReserveLife::Undefined(UndefinedReason::ExtractionFailed(*kind))
        }
    }
}

/// Reserve life of a stored filing
pub fn reserve_life(ticker: &Ticker, filing: &Filing) -> ReserveLife {
    match &filing.extraction {
        Some(result) => compute(result, ticker, filing.period_end, &filing.form),
        None => ReserveLife::Undefined(UndefinedReason::NotExtracted),
    }
}

/// Defined data points of a company, oldest period first
pub fn series(company: &Company) -> Vec<ReserveLifeDataPoint> {
    let mut points: Vec<_> = company
        .filings
        .iter()
        .filter_map(|f| match reserve_life(&company.ticker, f) {
            ReserveLife::Defined(point) => Some(point),
            ReserveLife::Undefined(_) => None,
        })
        .collect();
    points.sort_by_key(|p| p.period_end);
    points
}
