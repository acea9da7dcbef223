//! Command implementations.

pub mod company;
pub mod extract;
pub mod filings;
pub mod log;
pub mod series;

pub use self::company::execute_company;
pub use self::extract::execute_extract;
pub use self::filings::execute_filings;
pub use self::log::execute_log;
pub use self::series::execute_series;
