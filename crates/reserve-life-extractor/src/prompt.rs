//! LLM prompt for reserves and production extraction

use reserve_life_domain::{Filing, FilingType};

/// Builds the extraction prompt around a reduced excerpt
pub struct PromptBuilder {
    excerpt: String,
    company: Option<String>,
    context: Option<String>,
    quarterly: bool,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new(excerpt: impl Into<String>) -> Self {
        Self {
            excerpt: excerpt.into(),
            company: None,
            context: None,
            quarterly: false,
        }
    }

    /// Name the reporting company
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Describe the filing (form and period) the excerpt came from
    pub fn with_filing(mut self, filing: &Filing) -> Self {
        self.context = Some(format!(
            "Form {} for the period ending {}",
            filing.form, filing.period_end
        ));
        self.quarterly = filing.form == FilingType::Quarterly;
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");
        if self.quarterly {
            prompt.push_str(QUARTERLY_PRODUCTION);
            prompt.push_str("\n\n");
        }

        if let Some(company) = &self.company {
            prompt.push_str(&format!("Company: {}\n", company));
        }
        if let Some(context) = &self.context {
            prompt.push_str(&format!("Filing: {}\n", context));
        }
        if self.company.is_some() || self.context.is_some() {
            prompt.push('\n');
        }

        prompt.push_str("SEC filing content:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.excerpt);
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"Extract two figures about CRUDE OIL from the SEC filing content below.

1. Total proved crude oil reserves at the end of the period (developed plus undeveloped, all regions).
2. Crude oil production (annual volume, or the average daily rate if only that is given).

Rules:
- Crude oil only. Do not include natural gas, NGLs or barrels of oil equivalent unless crude oil is not reported separately; say so in confidence_notes if you do.
- Report each number exactly as stated in the filing, in the filing's own unit. Do not convert.
- Name the units in units_found as "<reserves unit>; <production unit>", for example "MMbbl; MBbl/d".
- Common units: bbl (barrels), MBbl (thousand barrels), MMbbl (million barrels), BBbl (billion barrels), and daily rates such as bbl/d, MBbl/d, BPD.
- Use null for a figure that is not in the content. Never guess."#;

const QUARTERLY_PRODUCTION: &str = r#"This is a quarterly report. Give production as the average daily rate for the quarter (for example "MBbl/d"), not a quarterly or year-to-date volume. If the filing only states a volume, report the three-month volume and name its unit without "/d"."#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (one JSON object only, no additional text):
{
  "reserves_barrels": <number or null>,
  "production_barrels_per_year": <number or null>,
  "units_found": "<reserves unit>; <production unit>",
  "confidence_notes": "<where the figures came from and any caveats>"
}

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reserve_life_domain::FilingType;

    #[test]
    fn test_prompt_includes_excerpt() {
        let prompt = PromptBuilder::new("[TABLE 1]\nProved reserves | 1,234").build();
        assert!(prompt.contains("Proved reserves | 1,234"));
        assert!(!prompt.contains("Company:"));
    }

    #[test]
    fn test_prompt_includes_field_names() {
        let prompt = PromptBuilder::new("x").build();
        for field in [
            "reserves_barrels",
            "production_barrels_per_year",
            "units_found",
            "confidence_notes",
        ] {
            assert!(prompt.contains(field), "missing {}", field);
        }
    }

    #[test]
    fn test_prompt_includes_filing_context() {
        let filing = Filing::new(
            "0000034088-24-000018",
            FilingType::Annual,
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            "https://www.sec.gov/x.htm",
        );
        let prompt = PromptBuilder::new("x")
            .with_company("XOM")
            .with_filing(&filing)
            .build();

        assert!(prompt.contains("Company: XOM"));
        assert!(prompt.contains("Form 10-K for the period ending 2023-12-31"));
        assert!(!prompt.contains("quarterly report"));
    }

    #[test]
    fn test_quarterly_prompt_asks_for_daily_rate() {
        let filing = Filing::new(
            "0000034088-24-000042",
            FilingType::Quarterly,
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            "https://www.sec.gov/q.htm",
        );
        let prompt = PromptBuilder::new("x").with_filing(&filing).build();

        assert!(prompt.contains("This is a quarterly report"));
        assert!(prompt.contains("average daily rate for the quarter"));
        assert!(prompt.contains("Form 10-Q for the period ending 2024-06-30"));
    }
}
