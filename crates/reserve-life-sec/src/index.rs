//! EDGAR page parsing
//!
//! Pure functions over the SEC ticker list, the company browse page and a
//! filing's `-index.htm` page. The client in [`crate::client`] fetches the
//! pages and hands them here.

use crate::error::{Result, SecError};
use chrono::NaiveDate;
use regex::Regex;
use reserve_life_domain::{FilingType, Ticker};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static ACCESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Acc-no:\s*([0-9-]+)").expect("accession pattern is valid"));

static PERIOD_OF_REPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)period\s+of\s+report").expect("period pattern is valid"));

static BROWSE_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.tableFile2 tr").expect("selector is valid"));
static CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("selector is valid"));
static HEADER_CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("selector is valid"));
static INFO_HEADS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.infoHead").expect("selector is valid"));
static TABLES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("selector is valid"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("selector is valid"));
static LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("selector is valid"));

/// A filing row from the company browse page
#[derive(Debug, Clone, PartialEq)]
pub struct FilingListing {
    /// Accession number
    pub accession: String,
    /// Submission date
    pub filing_date: NaiveDate,
    /// Form type
    pub form: FilingType,
}

/// Period and primary document read from a filing index page
#[derive(Debug, Clone, PartialEq)]
pub struct FilingDetails {
    /// End of the reporting period
    pub period_end: NaiveDate,
    /// Primary document URL
    pub url: String,
    /// Primary document file name
    pub document_name: String,
}

/// Find a ticker's CIK in SEC's `ticker.txt` (`ticker<TAB>cik` per line)
///
/// Returns the CIK zero-padded to 10 digits.
pub fn parse_ticker_list(text: &str, ticker: &Ticker) -> Option<String> {
    // SEC writes share classes with a dash: BRK.B is listed as brk-b
    let wanted = ticker.as_str().to_lowercase().replace('.', "-");
    text.lines().find_map(|line| {
        let (symbol, cik) = line.trim().split_once('\t')?;
        let cik = cik.trim();
        (symbol == wanted && !cik.is_empty() && cik.chars().all(|c| c.is_ascii_digit()))
            .then(|| format!("{:0>10}", cik))
    })
}

/// Read filings of `form` submitted between `start` and `end` (inclusive)
///
/// A page without the filings table yields no rows.
pub fn parse_browse_page(
    html: &str,
    form: &FilingType,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<FilingListing> {
    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for row in document.select(&BROWSE_ROWS) {
        let cells: Vec<ElementRef<'_>> = row.select(&CELLS).collect();
        if cells.len() < 4 {
            continue;
        }
        if !text_of(cells[0]).eq_ignore_ascii_case(form.as_str()) {
            continue;
        }
        let Ok(filing_date) = NaiveDate::parse_from_str(&text_of(cells[3]), "%Y-%m-%d") else {
            continue;
        };
        if filing_date < start || filing_date > end {
            continue;
        }
        let description = cells[2].text().collect::<String>();
        if let Some(captures) = ACCESSION.captures(&description) {
            listings.push(FilingListing {
                accession: captures[1].to_string(),
                filing_date,
                form: form.clone(),
            });
        }
    }

    listings
}

/// Directory of a filing in the EDGAR archive
pub fn archive_dir(base_url: &str, cik: &str, accession: &str) -> String {
    format!(
        "{}/Archives/edgar/data/{}/{}",
        base_url.trim_end_matches('/'),
        cik_number(cik),
        accession.replace('-', "")
    )
}

/// URL of a filing's index page
pub fn index_url(base_url: &str, cik: &str, accession: &str) -> String {
    format!("{}/{}-index.htm", archive_dir(base_url, cik, accession), accession)
}

/// Read the period of report and the primary document from an index page
pub fn parse_index_page(
    html: &str,
    base_url: &str,
    cik: &str,
    accession: &str,
    form: &FilingType,
) -> Result<FilingDetails> {
    let document = Html::parse_document(html);

    let period_text = period_of_report(&document)
        .ok_or_else(|| SecError::Parse(format!("{}: no period of report", accession)))?;
    let period_end = NaiveDate::parse_from_str(&period_text, "%Y-%m-%d").map_err(|e| {
        SecError::Parse(format!(
            "{}: bad period of report '{}': {}",
            accession, period_text, e
        ))
    })?;

    let (document_name, href) = primary_document(&document, form).ok_or_else(|| {
        SecError::Parse(format!("{}: no {} document in index", accession, form))
    })?;

    let base = base_url.trim_end_matches('/');
    let url = match href {
        Some(href) => {
            let href = href.strip_prefix("/ix?doc=").unwrap_or(&href);
            if href.starts_with('/') {
                format!("{}{}", base, href)
            } else {
                href.to_string()
            }
        }
        None => format!("{}/{}", archive_dir(base, cik, accession), document_name),
    };

    Ok(FilingDetails {
        period_end,
        url,
        document_name,
    })
}

fn period_of_report(document: &Html) -> Option<String> {
    let head = document
        .select(&INFO_HEADS)
        .find(|div| PERIOD_OF_REPORT.is_match(&text_of(*div)))?;
    let info = head
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "div" && e.value().classes().any(|c| c == "info"))?;
    Some(text_of(info))
}

/// Name and link of the first document row whose type matches `form`
fn primary_document(document: &Html, form: &FilingType) -> Option<(String, Option<String>)> {
    for table in document.select(&TABLES) {
        let mut doc_idx = None;
        let mut type_idx = None;

        for row in table.select(&ROWS) {
            let headers: Vec<_> = row.select(&HEADER_CELLS).collect();
            if !headers.is_empty() {
                for (idx, th) in headers.iter().enumerate() {
                    match text_of(*th).to_lowercase().as_str() {
                        "document" => doc_idx = Some(idx),
                        "type" => type_idx = Some(idx),
                        _ => {}
                    }
                }
                continue;
            }

            let (Some(d), Some(t)) = (doc_idx, type_idx) else {
                continue;
            };
            let cells: Vec<_> = row.select(&CELLS).collect();
            if cells.len() <= d.max(t) || text_of(cells[t]) != form.as_str() {
                continue;
            }

            let doc_cell = cells[d];
            if let Some(link) = doc_cell.select(&LINKS).next() {
                let name = text_of(link);
                let href = link.value().attr("href").map(str::to_string);
                return Some((name, href));
            }

            // No link: the cell text is the file name, sometimes followed by
            // a description
            let text = text_of(doc_cell);
            let name = match text.find(".htm") {
                Some(pos) => text[..pos + 4].to_string(),
                None => text.split_whitespace().next()?.to_string(),
            };
            return Some((name, None));
        }
    }
    None
}

fn cik_number(cik: &str) -> &str {
    let trimmed = cik.trim().trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const BROWSE_PAGE: &str = r#"
<html><body>
<table class="tableFile2" summary="Results">
  <tr><th>Filings</th><th>Format</th><th>Description</th><th>Filing Date</th><th>File/Film Number</th></tr>
  <tr>
    <td nowrap="nowrap">10-K</td>
    <td><a href="/Archives/edgar/data/34088/000003408824000018/0000034088-24-000018-index.htm">Documents</a></td>
    <td class="small">Annual report [Section 13 and 15(d), not S-K Item 405]<br />Acc-no: 0000034088-24-000018&nbsp;(34 Act)&nbsp; Size: 47 MB</td>
    <td>2024-02-28</td>
    <td>001-02256</td>
  </tr>
  <tr>
    <td nowrap="nowrap">10-K/A</td>
    <td></td>
    <td class="small">Amendment<br />Acc-no: 0000034088-23-000099&nbsp;(34 Act)</td>
    <td>2023-06-01</td>
    <td></td>
  </tr>
  <tr>
    <td nowrap="nowrap">10-K</td>
    <td></td>
    <td class="small">Annual report<br />Acc-no: 0000034088-23-000020&nbsp;(34 Act)</td>
    <td>2023-03-01</td>
    <td></td>
  </tr>
  <tr>
    <td nowrap="nowrap">10-K</td>
    <td></td>
    <td class="small">Annual report<br />Acc-no: 0000034088-15-000013&nbsp;(34 Act)</td>
    <td>2015-02-25</td>
    <td></td>
  </tr>
</table>
</body></html>"#;

    const INDEX_PAGE: &str = r#"
<html><body>
<div class="formGrouping">
  <div class="infoHead">Filing Date</div>
  <div class="info">2024-02-28</div>
  <div class="infoHead">Period of Report</div>
  <div class="info">2023-12-31</div>
</div>
<table class="tableFile" summary="Document Format Files">
  <tr><th scope="col">Seq</th><th scope="col">Description</th><th scope="col">Document</th><th scope="col">Type</th><th scope="col">Size</th></tr>
  <tr>
    <td>1</td><td>10-K</td>
    <td><a href="/ix?doc=/Archives/edgar/data/34088/000003408824000018/xom-20231231.htm">xom-20231231.htm</a> &nbsp;&nbsp;<span>iXBRL</span></td>
    <td>10-K</td><td>4853177</td>
  </tr>
  <tr>
    <td>2</td><td>EX-21</td>
    <td><a href="/Archives/edgar/data/34088/000003408824000018/ex21.htm">ex21.htm</a></td>
    <td>EX-21</td><td>1000</td>
  </tr>
</table>
</body></html>"#;

    #[test]
    fn test_parse_ticker_list() {
        let text = "aapl\t320193\nxom\t34088\nbrk-b\t1067983\n";
        let xom = Ticker::parse("XOM").unwrap();
        assert_eq!(parse_ticker_list(text, &xom).as_deref(), Some("0000034088"));

        let brk = Ticker::parse("BRK.B").unwrap();
        assert_eq!(parse_ticker_list(text, &brk).as_deref(), Some("0001067983"));

        let missing = Ticker::parse("ZZZZ").unwrap();
        assert_eq!(parse_ticker_list(text, &missing), None);
    }

    #[test]
    fn test_parse_browse_page_filters_dates_and_amendments() {
        let listings = parse_browse_page(
            BROWSE_PAGE,
            &FilingType::Annual,
            date(2019, 1, 1),
            date(2024, 12, 31),
        );

        let accessions: Vec<_> = listings.iter().map(|l| l.accession.as_str()).collect();
        assert_eq!(
            accessions,
            vec!["0000034088-24-000018", "0000034088-23-000020"]
        );
        assert_eq!(listings[0].filing_date, date(2024, 2, 28));
        assert_eq!(listings[0].form, FilingType::Annual);
    }

    #[test]
    fn test_parse_browse_page_without_table() {
        let listings = parse_browse_page(
            "<html><body>No matching CIK</body></html>",
            &FilingType::Annual,
            date(2019, 1, 1),
            date(2024, 12, 31),
        );
        assert!(listings.is_empty());
    }

    #[test]
    fn test_parse_index_page_unwraps_inline_xbrl() {
        let details = parse_index_page(
            INDEX_PAGE,
            "https://www.sec.gov",
            "0000034088",
            "0000034088-24-000018",
            &FilingType::Annual,
        )
        .unwrap();

        assert_eq!(details.period_end, date(2023, 12, 31));
        assert_eq!(details.document_name, "xom-20231231.htm");
        assert_eq!(
            details.url,
            "https://www.sec.gov/Archives/edgar/data/34088/000003408824000018/xom-20231231.htm"
        );
    }

    #[test]
    fn test_parse_index_page_wrong_form() {
        let result = parse_index_page(
            INDEX_PAGE,
            "https://www.sec.gov",
            "0000034088",
            "0000034088-24-000018",
            &FilingType::Quarterly,
        );
        assert!(matches!(result, Err(SecError::Parse(_))));
    }

    #[test]
    fn test_parse_index_page_without_link() {
        let html = r#"
<div class="infoHead">Period of Report</div><div class="info">2024-06-30</div>
<table>
  <tr><th>Document</th><th>Type</th></tr>
  <tr><td>q2.htm (primary)</td><td>10-Q</td></tr>
</table>"#;
        let details = parse_index_page(
            html,
            "https://www.sec.gov",
            "0000012345",
            "0000012345-24-000001",
            &FilingType::Quarterly,
        )
        .unwrap();

        assert_eq!(details.document_name, "q2.htm");
        assert_eq!(
            details.url,
            "https://www.sec.gov/Archives/edgar/data/12345/000001234524000001/q2.htm"
        );
    }

    #[test]
    fn test_index_url() {
        assert_eq!(
            index_url("https://www.sec.gov/", "0000034088", "0000034088-24-000018"),
            "https://www.sec.gov/Archives/edgar/data/34088/000003408824000018/0000034088-24-000018-index.htm"
        );
    }
}
