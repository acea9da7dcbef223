//! CLI command definitions and argument parsing.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use reserve_life_domain::Ticker;
use std::path::PathBuf;

/// Reserve Life - Track how many years of proved crude oil reserves oil companies hold.
#[derive(Debug, Parser)]
#[command(name = "reserve-life")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RESERVE_LIFE_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage tracked companies
    Company(CompanyArgs),

    /// Discover and list SEC filings
    Filings(FilingsArgs),

    /// Extract reserves and production from filings
    Extract(ExtractArgs),

    /// Show the reserve life series
    Series(SeriesArgs),

    /// Show the extraction log of a filing
    Log(LogArgs),
}

/// Arguments for company management.
#[derive(Debug, Args)]
pub struct CompanyArgs {
    #[command(subcommand)]
    pub action: CompanyAction,
}

/// Company management actions.
#[derive(Debug, Subcommand)]
pub enum CompanyAction {
    /// Start tracking a company
    Add {
        /// Ticker symbol
        #[arg(value_parser = Ticker::parse)]
        ticker: Ticker,

        /// Display name (looked up from market data when omitted)
        #[arg(short, long)]
        name: Option<String>,

        /// Skip the market data lookup
        #[arg(long)]
        no_lookup: bool,
    },

    /// Stop tracking a company and drop its filings
    Remove {
        /// Ticker symbol
        #[arg(value_parser = Ticker::parse)]
        ticker: Ticker,
    },

    /// List tracked companies
    List,
}

/// Arguments for filing management.
#[derive(Debug, Args)]
pub struct FilingsArgs {
    #[command(subcommand)]
    pub action: FilingsAction,
}

/// Filing actions.
#[derive(Debug, Subcommand)]
pub enum FilingsAction {
    /// Fetch new filings from EDGAR
    Update {
        /// Only this company (default: all)
        #[arg(short, long, value_parser = Ticker::parse)]
        ticker: Option<Ticker>,

        /// Earliest filing date (default: five years ago)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Latest filing date (default: today)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Form types to fetch
        #[arg(long = "form", default_values_t = vec!["10-K".to_string(), "10-Q".to_string()])]
        forms: Vec<String>,
    },

    /// List a company's filings
    List {
        /// Ticker symbol
        #[arg(value_parser = Ticker::parse)]
        ticker: Ticker,
    },
}

/// Arguments for extraction.
#[derive(Debug, Args)]
pub struct ExtractArgs {
    #[command(subcommand)]
    pub action: ExtractAction,
}

/// Extraction actions.
#[derive(Debug, Subcommand)]
pub enum ExtractAction {
    /// Extract a single filing
    One {
        /// Ticker symbol
        #[arg(value_parser = Ticker::parse)]
        ticker: Ticker,

        /// Accession number
        accession: String,
    },

    /// Extract every pending filing
    All {
        /// Re-run filings that already have a result
        #[arg(long)]
        force: bool,

        /// Only this company (default: all)
        #[arg(short, long, value_parser = Ticker::parse)]
        ticker: Option<Ticker>,
    },
}

/// Arguments for the series command.
#[derive(Debug, Args)]
pub struct SeriesArgs {
    /// Only this company (default: all)
    #[arg(value_parser = Ticker::parse)]
    pub ticker: Option<Ticker>,
}

/// Arguments for the log command.
#[derive(Debug, Args)]
pub struct LogArgs {
    /// Ticker symbol
    #[arg(value_parser = Ticker::parse)]
    pub ticker: Ticker,

    /// Accession number
    pub accession: String,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
