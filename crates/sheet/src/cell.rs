use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell of an uploaded table.
///
/// Values are deliberately loose: spreadsheets mix numbers and text freely,
/// so every place that needs a number goes through [`CellValue::coerce_number`]
/// and decides what to do with the [`Coerced`] outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Number(f64),
    String(String),
}

/// Outcome of coercing a cell to a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    /// The cell holds, or parses as, a finite number.
    Number(f64),
    /// The cell is empty or whitespace only.
    Blank,
    /// The cell holds text that is not a number.
    NotNumeric,
}

impl Coerced {
    /// Numeric contribution of the cell: blanks and text count as zero.
    #[must_use]
    pub fn or_zero(self) -> f64 {
        match self {
            Coerced::Number(n) => n,
            Coerced::Blank | Coerced::NotNumeric => 0.0,
        }
    }

    #[must_use]
    pub fn is_not_numeric(self) -> bool {
        matches!(self, Coerced::NotNumeric)
    }
}

impl CellValue {
    /// Check if the value is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Coerce the value to a number.
    ///
    /// Text is trimmed and parsed as `f64`; non-finite results (`NaN`, `inf`)
    /// are treated as text.
    #[must_use]
    pub fn coerce_number(&self) -> Coerced {
        match self {
            CellValue::Empty => Coerced::Blank,
            CellValue::Number(n) if n.is_finite() => Coerced::Number(*n),
            CellValue::Number(_) => Coerced::NotNumeric,
            CellValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Coerced::Blank;
                }
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() => Coerced::Number(n),
                    _ => Coerced::NotNumeric,
                }
            }
        }
    }

    /// Normalized text form used wherever cells are compared as keys.
    ///
    /// Text is trimmed, and numeric text that an `f64` holds exactly uses the
    /// number's display form, so `7`, `7.0` and `" 7 "` produce the same key.
    /// Anything else, such as `"00123"`, `"1e3"` or a 20 digit container
    /// number, keys on its trimmed text. Comparison stays case-sensitive.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => n.to_string(),
            CellValue::String(s) => {
                let trimmed = s.trim();
                let without_trailing_zeros = if trimmed.contains('.') {
                    trimmed.trim_end_matches('0').trim_end_matches('.')
                } else {
                    trimmed
                };
                match exact_number(without_trailing_zeros) {
                    Some(n) => n.to_string(),
                    None => trimmed.to_string(),
                }
            }
        }
    }

    /// Parse a string into a `CellValue` with type inference
    /// Tries: empty -> number -> string
    ///
    /// Only text that reads back identically becomes a number, so codes such
    /// as `"00123"` or `"0101.21"` keep their original text.
    #[must_use]
    pub fn parse(s: &str) -> CellValue {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        match exact_number(trimmed) {
            Some(n) => CellValue::Number(n),
            None => CellValue::String(s.to_string()),
        }
    }
}

/// Largest magnitude below which every integer is representable in an `f64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// The number `text` denotes, if an `f64` holds it exactly and displays it
/// as the same text.
fn exact_number(text: &str) -> Option<f64> {
    let n = text
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && n.abs() <= MAX_EXACT_INTEGER)?;
    (n.to_string() == text).then_some(n)
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Number(f)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Number(i as f64)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Number(f64::from(i))
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert_eq!(CellValue::parse(""), CellValue::Empty);
        assert_eq!(CellValue::parse("  "), CellValue::Empty);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(CellValue::parse("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::parse(" -2.5 "), CellValue::Number(-2.5));
    }

    #[test]
    fn test_parse_keeps_non_finite_as_text() {
        assert_eq!(CellValue::parse("NaN"), CellValue::String("NaN".to_string()));
        assert_eq!(CellValue::parse("inf"), CellValue::String("inf".to_string()));
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(CellValue::Number(3.0).coerce_number(), Coerced::Number(3.0));
        assert_eq!(CellValue::from(" 10 ").coerce_number(), Coerced::Number(10.0));
        assert_eq!(CellValue::Empty.coerce_number(), Coerced::Blank);
        assert_eq!(CellValue::from("   ").coerce_number(), Coerced::Blank);
        assert_eq!(CellValue::from("n/a").coerce_number(), Coerced::NotNumeric);
    }

    #[test]
    fn test_coerced_or_zero() {
        assert_eq!(Coerced::Number(2.5).or_zero(), 2.5);
        assert_eq!(Coerced::Blank.or_zero(), 0.0);
        assert_eq!(Coerced::NotNumeric.or_zero(), 0.0);
    }

    #[test]
    fn test_key_normalizes_numbers_and_whitespace() {
        assert_eq!(CellValue::Number(7.0).key(), "7");
        assert_eq!(CellValue::from(" 7 ").key(), "7");
        assert_eq!(CellValue::from("7.0").key(), "7");
        assert_eq!(CellValue::from(" Cable ").key(), "Cable");
        assert_ne!(CellValue::from("cable").key(), CellValue::from("Cable").key());
    }

    #[test]
    fn test_parse_keeps_codes_as_text() {
        assert_eq!(CellValue::parse("00123"), CellValue::from("00123"));
        assert_eq!(CellValue::parse("0101.21"), CellValue::from("0101.21"));
        assert_eq!(CellValue::parse("1e3"), CellValue::from("1e3"));
        assert_eq!(CellValue::parse("2.50"), CellValue::from("2.50"));
        assert_eq!(CellValue::parse("0"), CellValue::Number(0.0));
        assert_eq!(CellValue::parse("8544.42"), CellValue::Number(8544.42));
    }

    #[test]
    fn test_key_keeps_long_identifiers_distinct() {
        let a = CellValue::from("12345678901234567891");
        let b = CellValue::from("12345678901234567892");
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), "12345678901234567891");
        assert_eq!(CellValue::from("00123").key(), "00123");
        assert_ne!(CellValue::from("00123").key(), CellValue::from("123").key());
        assert_eq!(CellValue::from("1e3").key(), "1e3");
        assert_eq!(CellValue::from("2.50").key(), "2.5");
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Number(50.0).to_string(), "50");
        assert_eq!(CellValue::Number(0.5).to_string(), "0.5");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_serde_untagged() {
        let values: Vec<CellValue> = serde_json::from_str(r#"[null, 3, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                CellValue::Empty,
                CellValue::Number(3.0),
                CellValue::String("x".to_string())
            ]
        );
    }
}
