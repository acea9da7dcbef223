//! Unit normalization
//!
//! Filings report volumes in many spellings ("MMbbl", "thousand barrels",
//! "MBbls"). Everything is converted to a plain barrel count here. Production
//! figures may also be daily rates, which [`normalize_rate`] annualizes.

use regex::Regex;
use std::sync::LazyLock;

/// Days used to annualize a daily production rate
pub const DAYS_PER_YEAR: f64 = 365.0;

static MAGNITUDE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(thousand|million|billion)s?\b").expect("magnitude pattern is valid")
});

static DAILY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(/\s*d(ay)?\b|\bper\s+day\b|\ba\s+day\b|\bdaily\b|\b(mm|m|k)?b(o)?pd\b|\b(mm|m|k)bd\b)")
        .expect("daily pattern is valid")
});

static ANNUAL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(/\s*y(ea)?r\b|\bper\s+(year|annum)\b|\bannual(ly)?\b|\ba\s+year\b)")
        .expect("annual pattern is valid")
});

/// A value converted to barrels
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Converted value
    pub barrels: f64,

    /// Whether a daily rate was multiplied up to a year
    pub annualized: bool,

    /// Explanation when the conversion was not a plain table lookup
    pub note: Option<String>,
}

/// Multiplier for a recognized volume unit, or `None`
///
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn multiplier(unit: &str) -> Option<f64> {
    let unit = canonical(unit);
    let factor = match unit.as_str() {
        "bbl" | "bbls" | "barrel" | "barrels" | "bo" | "stb" => 1.0,
        "mbbl" | "mbbls" | "kbbl" | "kbbls" | "mbo" | "mstb" | "thousand barrels" | "thousands of barrels" => 1e3,
        "mmbbl" | "mmbbls" | "mmbo" | "mmstb" | "million barrels" | "millions of barrels" => 1e6,
        "bbbl" | "bbbls" | "billion barrels" | "billions of barrels" => 1e9,
        _ => return None,
    };
    Some(factor)
}

/// Convert a volume to barrels
///
/// Never fails. Units missing from the table fall back to a scan for
/// magnitude words, and otherwise the value is kept unconverted with a note.
///
/// # Examples
///
/// ```
/// use reserve_life_domain::units::normalize;
///
/// assert_eq!(normalize(5.0, "MMbbl").barrels, 5_000_000.0);
/// assert_eq!(normalize(2.0, "thousand barrels").barrels, 2_000.0);
/// ```
pub fn normalize(value: f64, unit: &str) -> Normalized {
    if !value.is_finite() {
        return Normalized {
            barrels: 0.0,
            annualized: false,
            note: Some(format!("value {} is not finite, treated as 0", value)),
        };
    }

    let (barrels, note) = convert_volume(value, unit);
    finish(barrels, false, note)
}

/// Convert a production figure to barrels per year
///
/// Daily rates (`/d`, `per day`, `bpd`, `b/d`, `MBD`, `kbd`, `daily`) are multiplied by
/// [`DAYS_PER_YEAR`]. Anything else is taken as an annual volume.
pub fn normalize_rate(value: f64, unit: &str) -> Normalized {
    if !value.is_finite() {
        return normalize(value, unit);
    }

    let (volume_unit, daily) = split_rate(unit);
    let (barrels, note) = convert_volume(value, &volume_unit);
    if !daily {
        return finish(barrels, false, note);
    }

    let annual = barrels * DAYS_PER_YEAR;
    let rate_note = format!("daily rate annualized ×{}", DAYS_PER_YEAR);
    let note = match note {
        Some(n) => format!("{}; {}", n, rate_note),
        None => rate_note,
    };
    finish(annual, true, Some(note))
}

/// Whether a unit explicitly names a yearly rate ("per year", "/yr", "annual")
pub fn is_annual(unit: &str) -> bool {
    ANNUAL_MARKER.is_match(&canonical(unit))
}

/// Split a `units_found` string into (reserves unit, production unit)
///
/// `"MMbbl; Mbbl/d"` names each figure's unit; a single unit applies to both.
pub fn split_units(units_found: &str) -> (String, String) {
    match units_found.split_once(';') {
        Some((reserves, production)) => {
            let reserves = reserves.trim();
            let production = production.trim();
            let production = if production.is_empty() { reserves } else { production };
            (reserves.to_string(), production.to_string())
        }
        None => {
            let unit = units_found.trim().to_string();
            (unit.clone(), unit)
        }
    }
}

fn convert_volume(value: f64, unit: &str) -> (f64, Option<String>) {
    if let Some(factor) = multiplier(unit) {
        return (value * factor, None);
    }

    let lowered = canonical(unit);
    if let Some(captures) = MAGNITUDE_WORD.captures(&lowered) {
        let (word, factor) = match &captures[1] {
            "thousand" => ("thousand", 1e3),
            "million" => ("million", 1e6),
            _ => ("billion", 1e9),
        };
        return (
            value * factor,
            Some(format!(
                "unit '{}' not in table, assumed {} barrels",
                unit.trim(),
                word
            )),
        );
    }

    (
        value,
        Some(format!("unit '{}' not recognized, assumed as-is", unit.trim())),
    )
}

/// Separate a daily marker from the volume part of a rate unit
fn split_rate(unit: &str) -> (String, bool) {
    let lowered = canonical(unit);
    let daily = DAILY_MARKER.is_match(&lowered);

    let mut volume = lowered.clone();
    if daily {
        volume = DAILY_MARKER
            .replace_all(&volume, |caps: &regex::Captures<'_>| {
                // bpd, mbpd, kbd, mmbd carry their own magnitude prefix
                if !caps[0].ends_with("pd") && !caps[0].ends_with("bd") {
                    return String::new();
                }
                match caps.get(3).or_else(|| caps.get(5)).map(|m| m.as_str()) {
                    Some("k") => "mbbl".to_string(),
                    Some(prefix) => format!("{}bbl", prefix),
                    None => "bbl".to_string(),
                }
            })
            .into_owned();
    } else {
        volume = ANNUAL_MARKER.replace_all(&volume, "").into_owned();
    }

    let volume = canonical(&volume);
    // "b/d", "mb/d", "kb/d", "mmb/d" leave a bare "b" behind
    let volume = match volume.as_str() {
        "b" => "bbl".to_string(),
        "mb" | "kb" => "mbbl".to_string(),
        "mmb" => "mmbbl".to_string(),
        _ => volume,
    };
    (volume, daily)
}

fn canonical(unit: &str) -> String {
    unit.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '.' || c == ',' || c == '(' || c == ')')
        .to_lowercase()
}

fn finish(barrels: f64, annualized: bool, note: Option<String>) -> Normalized {
    if barrels.is_finite() {
        return Normalized {
            barrels,
            annualized,
            note,
        };
    }
    Normalized {
        barrels: f64::MAX,
        annualized,
        note: Some(match note {
            Some(n) => format!("{}; value overflowed, clamped", n),
            None => "value overflowed, clamped".to_string(),
        }),
    }
}
