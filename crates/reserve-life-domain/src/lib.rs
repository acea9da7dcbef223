//! Reserve Life Domain Layer
//!
//! This crate contains the data model and the pure computations of the
//! reserve life tracker. It performs no I/O: network clients, persistence
//! and the LLM live in other crates behind the traits defined here.
//!
//! ## Key Concepts
//!
//! - **Company**: a ticker with its ordered list of filings
//! - **Filing**: one periodic SEC disclosure (10-K, 10-Q) with an optional
//!   extraction result attached
//! - **ExtractionResult**: the tagged outcome of pulling proved reserves and
//!   annual production out of a filing, with its audit log
//! - **Reserve life**: proved reserves ÷ annual production, in years
//!
//! ## Pure functions
//!
//! - [`units::normalize`] / [`units::normalize_rate`]: free-form unit strings
//!   to barrels
//! - [`reserve_life::compute`]: extraction result to a data point or the
//!   undefined sentinel

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod company;
pub mod extraction;
pub mod reserve_life;
pub mod ticker;
pub mod traits;
pub mod units;

// Re-exports for convenience
pub use company::{Company, Filing, FilingType};
pub use extraction::{ExtractionLog, ExtractionResult, FailureKind};
pub use reserve_life::{ReserveLife, ReserveLifeDataPoint, UndefinedReason};
pub use ticker::Ticker;
pub use traits::{CompanyStore, FilingSource, GenerationOptions, LlmProvider, Transient};
