//! Series command implementation.

use crate::cli::SeriesArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use reserve_life_domain::reserve_life;
use reserve_life_domain::traits::CompanyStore;
use reserve_life_domain::ReserveLifeDataPoint;
use reserve_life_store::JsonStore;

/// Execute the series command.
pub fn execute_series(args: SeriesArgs, store: &JsonStore, formatter: &Formatter) -> Result<()> {
    let points = collect_series(&args, store)?;
    println!("{}", formatter.format_series(&points)?);
    Ok(())
}

/// Data points of one company, or of every company ordered by ticker.
pub fn collect_series(args: &SeriesArgs, store: &JsonStore) -> Result<Vec<ReserveLifeDataPoint>> {
    let companies = match &args.ticker {
        Some(ticker) => vec![store
            .get_company(ticker)
            .ok_or_else(|| CliError::NotFound(ticker.to_string()))?],
        None => store.list_companies(),
    };

    Ok(companies
        .into_iter()
        .flat_map(reserve_life::series)
        .collect())
}
