//! Log command implementation.

use crate::cli::LogArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use reserve_life_domain::traits::CompanyStore;
use reserve_life_store::JsonStore;

/// Execute the log command.
pub fn execute_log(args: LogArgs, store: &JsonStore, formatter: &Formatter) -> Result<()> {
    let company = store
        .get_company(&args.ticker)
        .ok_or_else(|| CliError::NotFound(args.ticker.to_string()))?;
    let filing = company
        .filing(&args.accession)
        .ok_or_else(|| CliError::NotFound(format!("{} {}", args.ticker, args.accession)))?;

    println!("{}", formatter.format_log(filing)?);
    Ok(())
}
