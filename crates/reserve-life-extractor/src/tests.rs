//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{BatchOptions, Extractor, ExtractorConfig, ExtractorError, OutcomeStatus};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use reserve_life_domain::traits::{CompanyStore, FilingSource, Transient};
    use reserve_life_domain::{
        Company, ExtractionResult, FailureKind, Filing, FilingType, Ticker,
    };
    use reserve_life_llm::{LlmError, MockProvider};
    use reserve_life_store::JsonStore;
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::atomic::AtomicBool;

    const PROSE_RESPONSE: &str = r#"Some prose {"reserves_barrels": 100, "production_barrels_per_year": 10, "units_found": "bbl", "confidence_notes": "ok"} trailing text"#;

    const RESERVES_DOCUMENT: &str = r#"<html><body>
        <p>Our proved reserves of crude oil are summarized in the table below.</p>
        <table>
          <tr><td>Proved reserves (bbl)</td><td>100</td></tr>
          <tr><td>Crude oil production (bbl)</td><td>10</td></tr>
        </table>
        </body></html>"#;

    #[derive(Debug)]
    struct FetchError {
        transient: bool,
    }

    impl fmt::Display for FetchError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            if self.transient {
                write!(f, "archive unavailable")
            } else {
                write!(f, "document gone")
            }
        }
    }

    impl Transient for FetchError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    /// Serves documents by URL; unknown URLs are unavailable
    #[derive(Default)]
    struct FakeSource {
        documents: HashMap<String, String>,
        gone: Vec<String>,
    }

    impl FakeSource {
        fn with_document(mut self, url: &str, document: &str) -> Self {
            self.documents.insert(url.to_string(), document.to_string());
            self
        }

        fn with_gone(mut self, url: &str) -> Self {
            self.gone.push(url.to_string());
            self
        }
    }

    #[async_trait]
    impl FilingSource for FakeSource {
        type Error = FetchError;

        async fn fetch_document(&self, url: &str) -> Result<String, Self::Error> {
            if self.gone.iter().any(|g| g == url) {
                return Err(FetchError { transient: false });
            }
            self.documents
                .get(url)
                .cloned()
                .ok_or(FetchError { transient: true })
        }
    }

    fn filing(n: u32) -> Filing {
        Filing::new(
            format!("0000000001-2{}-000001", n),
            FilingType::Annual,
            NaiveDate::from_ymd_opt(2020 + n as i32, 12, 31).unwrap(),
            format!("https://www.sec.gov/doc{}.htm", n),
        )
    }

    fn extractor(source: FakeSource, llm: MockProvider) -> Extractor<FakeSource, MockProvider> {
        Extractor::new(source, llm, ExtractorConfig::default()).unwrap()
    }

    fn store_with_filings(count: u32) -> (JsonStore, Ticker) {
        let ticker = Ticker::parse("ACME").unwrap();
        let mut store = JsonStore::in_memory();
        store
            .add_company(Company::new(ticker.clone(), Some("Acme Oil".to_string())))
            .unwrap();
        store
            .merge_filings(&ticker, (0..count).map(filing).collect())
            .unwrap();
        (store, ticker)
    }

    fn source_for(count: u32) -> FakeSource {
        (0..count).fold(FakeSource::default(), |source, n| {
            source.with_document(&filing(n).url, RESERVES_DOCUMENT)
        })
    }

    #[tokio::test]
    async fn test_full_extraction_flow() {
        let llm = MockProvider::new(PROSE_RESPONSE);
        let extractor = extractor(source_for(1), llm.clone());

        let result = extractor.extract(&filing(0)).await;

        assert!(result.is_success(), "{:?}", result);
        assert_eq!(result.reserves_barrels(), Some(100.0));
        assert_eq!(result.production_barrels_per_year(), Some(10.0));
        assert_eq!(llm.call_count(), 1);

        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("[TABLE 1]"));
        assert!(prompt.contains("Form 10-K for the period ending 2020-12-31"));
    }

    #[tokio::test]
    async fn test_daily_rate_is_annualized() {
        let llm = MockProvider::new(
            r#"{"reserves_barrels": 1.5, "production_barrels_per_year": 20, "units_found": "MMbbl; MBbl/d", "confidence_notes": "table"}"#,
        );
        let extractor = extractor(source_for(1), llm);

        let result = extractor.extract(&filing(0)).await;

        assert_eq!(result.reserves_barrels(), Some(1_500_000.0));
        assert_eq!(result.production_barrels_per_year(), Some(7_300_000.0));
    }

    #[tokio::test]
    async fn test_quarterly_filing_comparable_with_annual() {
        let mut quarterly = filing(0);
        quarterly.form = FilingType::Quarterly;
        let llm = MockProvider::new(
            r#"{"reserves_barrels": 1000, "production_barrels_per_year": 25, "units_found": "MMbbl; MMbbl", "confidence_notes": "three months"}"#,
        );
        let extractor = extractor(source_for(1), llm.clone());

        let result = extractor.extract(&quarterly).await;

        assert_eq!(result.reserves_barrels(), Some(1_000_000_000.0));
        assert_eq!(result.production_barrels_per_year(), Some(100_000_000.0));
        assert!(llm.last_prompt().unwrap().contains("This is a quarterly report"));

        let years = reserve_life_domain::reserve_life::ratio(
            result.reserves_barrels().unwrap(),
            result.production_barrels_per_year().unwrap(),
        );
        assert_eq!(years, Some(10.0));
    }

    #[tokio::test]
    async fn test_no_relevant_content_skips_llm() {
        let source = FakeSource::default().with_document(
            &filing(0).url,
            "<html><body><p>Board of directors and executive compensation discussion.</p></body></html>",
        );
        let llm = MockProvider::new(PROSE_RESPONSE);
        let extractor = extractor(source, llm.clone());

        let result = extractor.extract(&filing(0)).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::NoData));
        assert_eq!(llm.call_count(), 0);
        assert!(result.log().iter().any(|e| e.contains("No relevant content")));
    }

    #[tokio::test]
    async fn test_extraction_with_invalid_json() {
        let llm = MockProvider::new("This is not JSON");
        let extractor = extractor(source_for(1), llm);

        let result = extractor.extract(&filing(0)).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::MalformedResponse));
        assert!(!result.log().is_empty());
    }

    #[tokio::test]
    async fn test_model_reports_not_found() {
        let llm = MockProvider::new(
            r#"{"reserves_barrels": null, "production_barrels_per_year": null, "units_found": "", "confidence_notes": "no reserves disclosure"}"#,
        );
        let extractor = extractor(source_for(1), llm);

        let result = extractor.extract(&filing(0)).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::NoData));
    }

    #[tokio::test]
    async fn test_fetch_failures() {
        let source = FakeSource::default().with_gone(&filing(1).url);
        let llm = MockProvider::new(PROSE_RESPONSE);
        let extractor = extractor(source, llm.clone());

        let unavailable = extractor.extract(&filing(0)).await;
        assert_eq!(unavailable.failure_kind(), Some(FailureKind::UpstreamUnavailable));

        let gone = extractor.extract(&filing(1)).await;
        assert_eq!(gone.failure_kind(), Some(FailureKind::NoData));

        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_llm_errors() {
        let mut llm = MockProvider::new(PROSE_RESPONSE);
        llm.add_error("2020-12-31", LlmError::RateLimitExceeded);
        llm.add_error("2021-12-31", LlmError::InvalidResponse("no choices".to_string()));
        let extractor = extractor(source_for(2), llm);

        let limited = extractor.extract(&filing(0)).await;
        assert_eq!(limited.failure_kind(), Some(FailureKind::UpstreamUnavailable));

        let invalid = extractor.extract(&filing(1)).await;
        assert_eq!(invalid.failure_kind(), Some(FailureKind::MalformedResponse));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = ExtractorConfig {
            max_tokens: 0,
            ..Default::default()
        };
        let result = Extractor::new(FakeSource::default(), MockProvider::default(), config);
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    #[tokio::test]
    async fn test_extract_one_persists() {
        let (mut store, ticker) = store_with_filings(1);
        let extractor = extractor(source_for(1), MockProvider::new(PROSE_RESPONSE));
        let accession = filing(0).accession;

        let result = extractor
            .extract_one(&mut store, &ticker, &accession)
            .await
            .unwrap();

        let stored = store.get_company(&ticker).unwrap().filing(&accession).unwrap();
        assert_eq!(stored.extraction.as_ref(), Some(&result));

        let missing = extractor.extract_one(&mut store, &ticker, "nope").await;
        assert!(matches!(missing, Err(ExtractorError::FilingNotFound { .. })));

        let unknown = Ticker::parse("NONE").unwrap();
        let missing = extractor.extract_one(&mut store, &unknown, &accession).await;
        assert!(matches!(missing, Err(ExtractorError::CompanyNotFound(_))));
    }

    #[tokio::test]
    async fn test_batch_survives_unavailable_filing() {
        let (mut store, ticker) = store_with_filings(4);
        // filing 2 has no document, so its fetch is unavailable
        let source = (0..4)
            .filter(|n| *n != 2)
            .fold(FakeSource::default(), |source, n| {
                source.with_document(&filing(n).url, RESERVES_DOCUMENT)
            });
        let extractor = extractor(source, MockProvider::new(PROSE_RESPONSE));

        let report = extractor
            .extract_all(&mut store, &BatchOptions::default(), &AtomicBool::new(false))
            .await;

        assert_eq!(report.extracted, 3);
        assert_eq!(report.unavailable, 1);
        assert!(!report.stopped);

        let company = store.get_company(&ticker).unwrap();
        for (n, stored) in company.filings.iter().enumerate() {
            let result = stored.extraction.as_ref().unwrap();
            if n == 2 {
                assert_eq!(result.failure_kind(), Some(FailureKind::UpstreamUnavailable));
            } else {
                assert_eq!(result.reserves_barrels(), Some(100.0));
            }
        }
    }

    #[tokio::test]
    async fn test_batch_skips_final_results() {
        let (mut store, _) = store_with_filings(3);
        let source = source_for(3);
        let mut first_llm = MockProvider::new(PROSE_RESPONSE);
        first_llm.add_error("2022-12-31", LlmError::Communication("reset".to_string()));
        let first = extractor(source_for(3), first_llm);

        let report = first
            .extract_all(&mut store, &BatchOptions::default(), &AtomicBool::new(false))
            .await;
        assert_eq!(report.extracted, 2);
        assert_eq!(report.unavailable, 1);

        let second = extractor(source, MockProvider::new(PROSE_RESPONSE));
        let report = second
            .extract_all(&mut store, &BatchOptions::default(), &AtomicBool::new(false))
            .await;

        assert_eq!(report.skipped, 2);
        assert_eq!(report.extracted, 1);
        assert_eq!(report.attempted(), 1);
    }

    #[tokio::test]
    async fn test_rerun_replaces_with_identical_result() {
        let (mut store, ticker) = store_with_filings(2);
        let extractor = extractor(source_for(2), MockProvider::new(PROSE_RESPONSE));
        let stop = AtomicBool::new(false);

        extractor
            .extract_all(&mut store, &BatchOptions::forced(), &stop)
            .await;
        let before: Vec<Option<ExtractionResult>> = store
            .get_company(&ticker)
            .unwrap()
            .filings
            .iter()
            .map(|f| f.extraction.clone())
            .collect();

        let report = extractor
            .extract_all(&mut store, &BatchOptions::forced(), &stop)
            .await;
        let after: Vec<Option<ExtractionResult>> = store
            .get_company(&ticker)
            .unwrap()
            .filings
            .iter()
            .map(|f| f.extraction.clone())
            .collect();

        assert_eq!(report.skipped, 0);
        assert_eq!(report.extracted, 2);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_unavailable_keeps_previous_success() {
        let (mut store, ticker) = store_with_filings(1);
        let accession = filing(0).accession;

        let good = extractor(source_for(1), MockProvider::new(PROSE_RESPONSE));
        good.extract_one(&mut store, &ticker, &accession).await.unwrap();

        let down = extractor(FakeSource::default(), MockProvider::new(PROSE_RESPONSE));
        let result = down.extract_one(&mut store, &ticker, &accession).await.unwrap();
        assert_eq!(result.failure_kind(), Some(FailureKind::UpstreamUnavailable));

        let stored = store.get_company(&ticker).unwrap().filing(&accession).unwrap();
        assert!(stored.extraction.as_ref().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_stop_flag_halts_batch() {
        let (mut store, _) = store_with_filings(3);
        let source = source_for(3);
        let llm = MockProvider::new(PROSE_RESPONSE);
        let extractor = extractor(source, llm.clone());

        let report = extractor
            .extract_all(&mut store, &BatchOptions::default(), &AtomicBool::new(true))
            .await;

        assert!(report.stopped);
        assert!(report.outcomes.is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_batch_ticker_filter() {
        let (mut store, ticker) = store_with_filings(1);
        let other = Ticker::parse("ZZZ").unwrap();
        store.add_company(Company::new(other.clone(), None)).unwrap();
        store.merge_filings(&other, vec![filing(5)]).unwrap();

        let source = source_for(1).with_document(&filing(5).url, RESERVES_DOCUMENT);
        let extractor = extractor(source, MockProvider::new(PROSE_RESPONSE));
        let options = BatchOptions {
            force: false,
            ticker: Some(ticker.clone()),
        };

        let report = extractor
            .extract_all(&mut store, &options, &AtomicBool::new(false))
            .await;

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].ticker, ticker);
        assert_eq!(report.outcomes[0].status, OutcomeStatus::Extracted);
        assert!(store.get_company(&other).unwrap().filings[0].extraction.is_none());
    }
}
