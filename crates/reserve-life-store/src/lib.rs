//! Reserve Life Storage Layer
//!
//! Implements the CompanyStore trait on a single JSON document.
//!
//! # Format
//!
//! ```json
//! { "companies": { "XOM": { "ticker": "XOM", "name": "...", "filings": [ ... ] } } }
//! ```
//!
//! The whole document is read on open and rewritten on every mutation,
//! through a temporary file that is renamed over the original. A mutation
//! only reaches memory once the write has succeeded.
//!
//! # Examples
//!
//! ```no_run
//! use reserve_life_store::JsonStore;
//!
//! let store = JsonStore::open("companies.json").unwrap();
//! // Store is now ready for company operations
//! ```

#![warn(missing_docs)]

use reserve_life_domain::traits::CompanyStore;
use reserve_life_domain::{Company, ExtractionResult, Filing, Ticker};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// File system error
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Document could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Company or filing not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Company already tracked
    #[error("Company already exists: {0}")]
    Duplicate(Ticker),
}

/// On-disk document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    companies: BTreeMap<Ticker, Company>,
}

/// JSON-file implementation of CompanyStore
///
/// The store is owned by one command at a time; there is no locking between
/// processes.
pub struct JsonStore {
    path: Option<PathBuf>,
    data: StoreFile,
}

impl JsonStore {
    /// Open the store at `path`
    ///
    /// A missing file gives an empty store. A file that cannot be parsed is
    /// moved aside to `<path>.corrupt` and the store starts empty.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use reserve_life_store::JsonStore;
    ///
    /// let store = JsonStore::open("/tmp/reserve-life.json").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<StoreFile>(&text) {
                Ok(data) => {
                    debug!("Loaded {} companies from {}", data.companies.len(), path.display());
                    data
                }
                Err(e) => {
                    let aside = sibling(&path, "corrupt");
                    fs::rename(&path, &aside).map_err(|e| io_error(&aside, e))?;
                    warn!(
                        "Store file {} is corrupt ({}), moved to {} and starting empty",
                        path.display(),
                        e,
                        aside.display()
                    );
                    StoreFile::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No store file at {}, starting empty", path.display());
                StoreFile::default()
            }
            Err(e) => return Err(io_error(&path, e)),
        };

        Ok(Self {
            path: Some(path),
            data,
        })
    }

    /// Create a store that is never written to disk (useful for testing)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: StoreFile::default(),
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write `data` through a temp file and rename, then make it current
    fn commit(&mut self, data: StoreFile) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            write_file(path, &data)?;
            debug!("Saved {} companies to {}", data.companies.len(), path.display());
        }
        self.data = data;
        Ok(())
    }

    /// Commit the document with `company` replacing its previous version
    fn commit_company(&mut self, company: Company) -> Result<(), StoreError> {
        let mut data = self.data.clone();
        data.companies.insert(company.ticker.clone(), company);
        self.commit(data)
    }

    /// Working copy of a tracked company
    fn company(&self, ticker: &Ticker) -> Result<Company, StoreError> {
        self.data
            .companies
            .get(ticker)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(ticker.to_string()))
    }
}

fn write_file(path: &Path, data: &StoreFile) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let json = serde_json::to_string_pretty(data)?;
    let tmp = sibling(path, "tmp");
    fs::write(&tmp, json).map_err(|e| io_error(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| io_error(path, e))
}

/// `path` with `.suffix` appended to the file name
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl CompanyStore for JsonStore {
    type Error = StoreError;

    fn add_company(&mut self, company: Company) -> Result<(), Self::Error> {
        if self.data.companies.contains_key(&company.ticker) {
            return Err(StoreError::Duplicate(company.ticker));
        }
        info!("Adding company {} ({})", company.ticker, company.name);
        self.commit_company(company)
    }

    fn remove_company(&mut self, ticker: &Ticker) -> Result<Company, Self::Error> {
        let mut data = self.data.clone();
        let company = data
            .companies
            .remove(ticker)
            .ok_or_else(|| StoreError::NotFound(ticker.to_string()))?;
        self.commit(data)?;
        info!("Removed company {} and {} filings", ticker, company.filings.len());
        Ok(company)
    }

    fn get_company(&self, ticker: &Ticker) -> Option<&Company> {
        self.data.companies.get(ticker)
    }

    fn list_companies(&self) -> Vec<&Company> {
        self.data.companies.values().collect()
    }

    fn merge_filings(&mut self, ticker: &Ticker, filings: Vec<Filing>) -> Result<usize, Self::Error> {
        let mut company = self.company(ticker)?;
        let added = filings
            .into_iter()
            .map(|filing| company.insert_filing(filing))
            .filter(|inserted| *inserted)
            .count();

        if added > 0 {
            self.commit_company(company)?;
            info!("Added {} filings to {}", added, ticker);
        }
        Ok(added)
    }

    fn set_cik(&mut self, ticker: &Ticker, cik: &str) -> Result<(), Self::Error> {
        let mut company = self.company(ticker)?;
        if company.cik.as_deref() == Some(cik) {
            return Ok(());
        }
        company.cik = Some(cik.to_string());
        self.commit_company(company)
    }

    fn attach_extraction(
        &mut self,
        ticker: &Ticker,
        accession: &str,
        result: ExtractionResult,
    ) -> Result<bool, Self::Error> {
        let mut company = self.company(ticker)?;
        let filing = company
            .filing_mut(accession)
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", ticker, accession)))?;

        let changed = filing.attach_extraction(result);
        if changed {
            self.commit_company(company)?;
        } else {
            debug!("Kept previous result for {} {}", ticker, accession);
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_never_writes() {
        let mut store = JsonStore::in_memory();
        let ticker = Ticker::parse("XOM").unwrap();
        store.add_company(Company::new(ticker.clone(), None)).unwrap();
        assert!(store.path().is_none());
        assert_eq!(store.list_companies().len(), 1);
    }

    #[test]
    fn test_document_shape() {
        let mut data = StoreFile::default();
        let ticker = Ticker::parse("CVX").unwrap();
        data.companies
            .insert(ticker.clone(), Company::new(ticker, Some("Chevron".to_string())));

        let json: serde_json::Value = serde_json::to_value(&data).unwrap();
        assert_eq!(json["companies"]["CVX"]["name"], "Chevron");
    }
}
