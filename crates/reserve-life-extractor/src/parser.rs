//! Parse LLM output into raw reserve and production figures
//!
//! The model is asked for a single JSON object but may wrap it in prose or
//! markdown. The first object that decodes is used. When none decodes, a
//! regex pass over the prose looks for "reserves ... N unit" and
//! "production ... N unit"; that branch is logged as a fallback.

use regex::Regex;
use reserve_life_domain::ExtractionLog;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;

const RESERVES_FIELD: &str = "reserves_barrels";
const PRODUCTION_FIELD: &str = "production_barrels_per_year";

static RESERVES_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)reserves?\b[^0-9]{0,80}?(\d[\d,]*(?:\.\d+)?)\s*((?:billion|million|thousand)\s+barrels|mmbbls?|mbbls?|bbbls?|bbls?|barrels|mmbo|mbo)",
    )
    .expect("reserves pattern is valid")
});

static PRODUCTION_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)production\b[^0-9]{0,80}?(\d[\d,]*(?:\.\d+)?)\s*((?:(?:billion|million|thousand)\s+)?barrels(?:\s+per\s+day|\s+a\s+day|/d)?|(?:mm|m)?bbls?(?:/d)?|m?bpd|b/d)",
    )
    .expect("production pattern is valid")
});

/// Figures as the model reported them, before unit normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawFigures {
    /// Reserves in the reported unit
    pub reserves: f64,
    /// Production in the reported unit
    pub production: f64,
    /// Unit string(s) as reported
    pub units_found: String,
    /// Model's notes
    pub confidence_notes: String,
    /// Whether the figures came from the text fallback
    pub from_fallback: bool,
}

/// Outcome of parsing one LLM response
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// Both figures present
    Figures(RawFigures),
    /// The model reported a figure as not found
    NoData(String),
    /// The response could not be understood
    Malformed(String),
}

/// Parse an LLM response; never fails, every step is logged
pub fn parse_llm_response(response: &str, log: &mut ExtractionLog) -> ParsedResponse {
    if response.trim().is_empty() {
        return ParsedResponse::Malformed("empty response".to_string());
    }

    if let Some(object) = find_object(response) {
        log.note("Parsed JSON object from LLM response");
        return parse_object(&object);
    }

    log.note("No JSON object in LLM response; trying text fallback");
    match text_fallback(response) {
        Some(figures) => {
            log.note(format!(
                "Text fallback found reserves {} and production {} ({})",
                figures.reserves, figures.production, figures.units_found
            ));
            ParsedResponse::Figures(figures)
        }
        None => ParsedResponse::Malformed(
            "response contained no JSON object and no recognizable figures".to_string(),
        ),
    }
}

/// First decodable JSON object, preferring one with an expected field
fn find_object(text: &str) -> Option<Map<String, Value>> {
    let mut first = None;

    for (start, c) in text.char_indices() {
        if c != '{' {
            continue;
        }
        let Some(end) = matching_brace(text, start) else {
            continue;
        };
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(&text[start..=end]) else {
            debug!(start, "Skipping undecodable JSON candidate");
            continue;
        };
        if object.contains_key(RESERVES_FIELD) || object.contains_key(PRODUCTION_FIELD) {
            return Some(object);
        }
        first.get_or_insert(object);
    }

    first
}

/// Byte index of the brace closing the one at `start`, skipping string contents
fn matching_brace(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_object(object: &Map<String, Value>) -> ParsedResponse {
    let reserves = match field_number(object, RESERVES_FIELD) {
        Ok(value) => value,
        Err(reason) => return ParsedResponse::Malformed(reason),
    };
    let production = match field_number(object, PRODUCTION_FIELD) {
        Ok(value) => value,
        Err(reason) => return ParsedResponse::Malformed(reason),
    };

    let (reserves, production) = match (reserves, production) {
        (Some(r), Some(p)) => (r, p),
        (None, None) => {
            return ParsedResponse::NoData("model found neither reserves nor production".into())
        }
        (None, Some(_)) => return ParsedResponse::NoData("model found no reserves figure".into()),
        (Some(_), None) => {
            return ParsedResponse::NoData("model found no production figure".into())
        }
    };

    ParsedResponse::Figures(RawFigures {
        reserves,
        production,
        units_found: field_text(object, "units_found"),
        confidence_notes: field_text(object, "confidence_notes"),
        from_fallback: false,
    })
}

/// A numeric field: JSON number or numeric string, `None` for null
fn field_number(object: &Map<String, Value>, field: &str) -> Result<Option<f64>, String> {
    let value = object
        .get(field)
        .ok_or_else(|| format!("missing field '{}'", field))?;

    let number = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("'{}' is not representable: {}", field, n))?,
        Value::String(s) => {
            let trimmed = s.trim();
            if is_null_word(trimmed) {
                return Ok(None);
            }
            parse_numeric(trimmed)
                .ok_or_else(|| format!("'{}' is not a number: {:?}", field, s))?
        }
        other => return Err(format!("'{}' has the wrong type: {}", field, other)),
    };

    if !number.is_finite() || number < 0.0 {
        return Err(format!("'{}' must be a non-negative number, got {}", field, number));
    }
    Ok(Some(number))
}

fn field_text(object: &Map<String, Value>, field: &str) -> String {
    match object.get(field) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn is_null_word(text: &str) -> bool {
    matches!(
        text.to_lowercase().as_str(),
        "" | "null" | "none" | "n/a" | "na" | "not found" | "unknown"
    )
}

/// Parse "1,234.5" style numbers
fn parse_numeric(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    cleaned.parse::<f64>().ok()
}

fn text_fallback(response: &str) -> Option<RawFigures> {
    let reserves = RESERVES_TEXT.captures(response)?;
    let production = PRODUCTION_TEXT.captures(response)?;

    let reserves_value = parse_numeric(&reserves[1])?;
    let production_value = parse_numeric(&production[1])?;

    Some(RawFigures {
        reserves: reserves_value,
        production: production_value,
        units_found: format!("{}; {}", &reserves[2], &production[2]),
        confidence_notes: "recovered from free text".to_string(),
        from_fallback: true,
    })
}
