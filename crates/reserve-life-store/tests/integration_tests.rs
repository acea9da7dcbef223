//! Integration tests for reserve-life-store
//!
//! These tests verify persistence of companies, filings and extraction
//! results across store instances.

use chrono::NaiveDate;
use reserve_life_domain::traits::CompanyStore;
use reserve_life_domain::{
    Company, ExtractionLog, ExtractionResult, FailureKind, Filing, FilingType, Ticker,
};
use reserve_life_store::{JsonStore, StoreError};
use tempfile::TempDir;

fn ticker(symbol: &str) -> Ticker {
    Ticker::parse(symbol).unwrap()
}

fn filing(accession: &str, year: i32) -> Filing {
    Filing::new(
        accession,
        FilingType::Annual,
        NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
        format!("https://www.sec.gov/Archives/{}.htm", accession),
    )
}

fn success(reserves: f64) -> ExtractionResult {
    ExtractionResult::success(reserves, 100.0, "bbl", "", ExtractionLog::new())
}

#[test]
fn test_missing_file_is_empty_store() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::open(dir.path().join("companies.json")).unwrap();
    assert!(store.list_companies().is_empty());
}

#[test]
fn test_add_and_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("companies.json");

    {
        let mut store = JsonStore::open(&path).unwrap();
        let mut company = Company::new(ticker("XOM"), Some("Exxon Mobil".to_string()));
        company.price = Some(110.5);
        company.currency = Some("USD".to_string());
        store.add_company(company).unwrap();
        store.set_cik(&ticker("XOM"), "0000034088").unwrap();
    }

    assert!(path.exists());
    let store = JsonStore::open(&path).unwrap();
    let company = store.get_company(&ticker("XOM")).unwrap();
    assert_eq!(company.name, "Exxon Mobil");
    assert_eq!(company.price, Some(110.5));
    assert_eq!(company.cik.as_deref(), Some("0000034088"));
}

#[test]
fn test_duplicate_company_rejected() {
    let mut store = JsonStore::in_memory();
    store.add_company(Company::new(ticker("CVX"), None)).unwrap();

    let result = store.add_company(Company::new(ticker("cvx"), Some("Chevron".to_string())));
    assert!(matches!(result, Err(StoreError::Duplicate(_))));
    assert_eq!(store.get_company(&ticker("CVX")).unwrap().name, "CVX");
}

#[test]
fn test_list_ordered_by_ticker() {
    let mut store = JsonStore::in_memory();
    for symbol in ["XOM", "BP", "CVX"] {
        store.add_company(Company::new(ticker(symbol), None)).unwrap();
    }

    let tickers: Vec<&str> = store
        .list_companies()
        .iter()
        .map(|c| c.ticker.as_str())
        .collect();
    assert_eq!(tickers, vec!["BP", "CVX", "XOM"]);
}

#[test]
fn test_remove_company() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("companies.json");
    let mut store = JsonStore::open(&path).unwrap();
    store.add_company(Company::new(ticker("OXY"), None)).unwrap();
    store.merge_filings(&ticker("OXY"), vec![filing("a", 2022)]).unwrap();

    let removed = store.remove_company(&ticker("OXY")).unwrap();
    assert_eq!(removed.filings.len(), 1);

    let reopened = JsonStore::open(&path).unwrap();
    assert!(reopened.get_company(&ticker("OXY")).is_none());

    let missing = store.remove_company(&ticker("OXY"));
    assert!(matches!(missing, Err(StoreError::NotFound(_))));
}

#[test]
fn test_merge_never_overwrites() {
    let mut store = JsonStore::in_memory();
    let xom = ticker("XOM");
    store.add_company(Company::new(xom.clone(), None)).unwrap();

    let added = store
        .merge_filings(&xom, vec![filing("b", 2023), filing("a", 2022)])
        .unwrap();
    assert_eq!(added, 2);
    store.attach_extraction(&xom, "a", success(1000.0)).unwrap();

    let mut refetched = filing("a", 2022);
    refetched.url = "https://example.com/other.htm".to_string();
    let added = store
        .merge_filings(&xom, vec![refetched, filing("c", 2024)])
        .unwrap();
    assert_eq!(added, 1);

    let company = store.get_company(&xom).unwrap();
    let accessions: Vec<&str> = company.filings.iter().map(|f| f.accession.as_str()).collect();
    assert_eq!(accessions, vec!["a", "b", "c"]);
    let kept = company.filing("a").unwrap();
    assert!(kept.url.contains("Archives"));
    assert_eq!(kept.extraction.as_ref().unwrap().reserves_barrels(), Some(1000.0));
}

#[test]
fn test_merge_unknown_company() {
    let mut store = JsonStore::in_memory();
    let result = store.merge_filings(&ticker("NONE"), vec![filing("a", 2022)]);
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_extraction_persists_and_replaces() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("companies.json");
    let xom = ticker("XOM");

    {
        let mut store = JsonStore::open(&path).unwrap();
        store.add_company(Company::new(xom.clone(), None)).unwrap();
        store.merge_filings(&xom, vec![filing("a", 2023)]).unwrap();
        assert!(store.attach_extraction(&xom, "a", success(500.0)).unwrap());
        assert!(store.attach_extraction(&xom, "a", success(700.0)).unwrap());

        let down = ExtractionResult::failure(
            FailureKind::UpstreamUnavailable,
            "LLM unreachable",
            ExtractionLog::new(),
        );
        assert!(!store.attach_extraction(&xom, "a", down).unwrap());
    }

    let store = JsonStore::open(&path).unwrap();
    let result = store
        .get_company(&xom)
        .unwrap()
        .filing("a")
        .unwrap()
        .extraction
        .clone()
        .unwrap();
    assert_eq!(result.reserves_barrels(), Some(700.0));
}

#[test]
fn test_attach_to_unknown_filing() {
    let mut store = JsonStore::in_memory();
    store.add_company(Company::new(ticker("XOM"), None)).unwrap();
    let result = store.attach_extraction(&ticker("XOM"), "missing", success(1.0));
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_corrupt_file_gives_empty_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("companies.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut store = JsonStore::open(&path).unwrap();
    assert!(store.list_companies().is_empty());

    let aside = dir.path().join("companies.json.corrupt");
    assert_eq!(std::fs::read_to_string(&aside).unwrap(), "{ not json");

    store.add_company(Company::new(ticker("XOM"), None)).unwrap();
    let reopened = JsonStore::open(&path).unwrap();
    assert_eq!(reopened.list_companies().len(), 1);
    assert_eq!(std::fs::read_to_string(&aside).unwrap(), "{ not json");
}

#[test]
fn test_failed_write_leaves_store_unchanged() {
    let dir = TempDir::new().unwrap();
    let parent = dir.path().join("data");
    let path = parent.join("companies.json");

    let mut store = JsonStore::open(&path).unwrap();
    store.add_company(Company::new(ticker("XOM"), None)).unwrap();
    store.merge_filings(&ticker("XOM"), vec![filing("0000034088-24-000018", 2023)]).unwrap();

    // Replace the directory with a plain file so every write fails
    std::fs::remove_dir_all(&parent).unwrap();
    std::fs::write(&parent, "not a directory").unwrap();

    assert!(store.add_company(Company::new(ticker("CVX"), None)).is_err());
    assert!(store.get_company(&ticker("CVX")).is_none());

    assert!(store.set_cik(&ticker("XOM"), "0000034088").is_err());
    assert!(store
        .attach_extraction(&ticker("XOM"), "0000034088-24-000018", success(500.0))
        .is_err());
    assert!(store.remove_company(&ticker("XOM")).is_err());

    let xom = store.get_company(&ticker("XOM")).unwrap();
    assert!(xom.cik.is_none());
    assert!(xom.filings[0].extraction.is_none());

    // Once writes work again the same add succeeds
    std::fs::remove_file(&parent).unwrap();
    store.add_company(Company::new(ticker("CVX"), None)).unwrap();
    assert_eq!(JsonStore::open(&path).unwrap().list_companies().len(), 2);
}

#[test]
fn test_no_temp_file_left_behind() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("companies.json");
    let mut store = JsonStore::open(&path).unwrap();
    store.add_company(Company::new(ticker("XOM"), None)).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["companies.json"]);
}
