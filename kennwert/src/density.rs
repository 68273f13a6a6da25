//! Density resolution for environmental reference rows
//!
//! Source tables carry density as a number, a numeric string, a textual
//! range such as `"1400 - 1500"`, free text, or nothing at all. Every row
//! ends up with exactly one non-negative value; `0.0` is the "no density"
//! sentinel that the LCA engine rejects when a mass is needed.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d+(?:[.,]\d+)?)\s*-\s*(\d+(?:[.,]\d+)?)").expect("valid density range pattern")
    })
}

/// Outcome of resolving one raw density value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Density {
    /// A usable value
    Resolved(f64),
    /// Absent or unparseable; stands in as 0.0
    Defaulted,
}

impl Density {
    pub fn value(&self) -> f64 {
        match self {
            Density::Resolved(value) => *value,
            Density::Defaulted => 0.0,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Density::Defaulted)
    }
}

/// Parse a textual density: range mean first, then a plain number.
///
/// Text after a range (usually a unit such as `kg/m3`) is ignored.
pub fn parse_density_text(text: &str) -> Option<f64> {
    if let Some(captures) = range_pattern().captures(text) {
        let low = parse_number(&captures[1])?;
        let high = parse_number(&captures[2])?;
        return Some((low + high) / 2.0);
    }
    parse_number(text)
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// Resolve a raw JSON density value
pub fn resolve(raw: Option<&Value>) -> Density {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64().filter(|value| value.is_finite() && *value >= 0.0),
        Some(Value::String(s)) => parse_density_text(s),
        _ => None,
    };
    match parsed {
        Some(value) => Density::Resolved(value),
        None => Density::Defaulted,
    }
}

/// Resolve a raw density for a reference row, warning when it defaults.
///
/// The warning names the reference key and is both logged and returned so
/// callers can surface it next to the results.
pub fn resolve_for_key(key: &str, raw: Option<&Value>) -> (f64, Option<String>) {
    let density = resolve(raw);
    if density.is_defaulted() {
        let warning = format!("Used no density (0) for reference {}", key);
        tracing::warn!(reference = key, raw = ?raw, "density unavailable, defaulting to 0");
        return (0.0, Some(warning));
    }
    (density.value(), None)
}
