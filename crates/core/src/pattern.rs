//! Auto-number format patterns.
//!
//! Patterns use printf-style integer conversions: `%d`, `%5d` (space padded),
//! `%05d` (zero padded) and `%%` for a literal percent sign. A pattern holds
//! exactly one numeric placeholder.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CONVERSION: Regex =
        Regex::new(r"%(?:(?P<percent>%)|(?P<zero>0)?(?P<width>[1-9][0-9]*)?d)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Number { width: usize, zero_pad: bool },
}

/// A parsed auto-number pattern such as `INV-%03d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberPattern {
    segments: Vec<Segment>,
}

impl NumberPattern {
    /// Parse a pattern, returning a human-readable reason on failure.
    pub fn parse(pattern: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut placeholders = 0usize;
        let mut last = 0usize;

        for caps in CONVERSION.captures_iter(pattern) {
            let Some(whole) = caps.get(0) else { continue };
            let between = &pattern[last..whole.start()];
            if let Some(offset) = between.find('%') {
                return Err(format!(
                    "unsupported '%' sequence at position {}",
                    last + offset
                ));
            }
            literal.push_str(between);
            last = whole.end();

            if caps.name("percent").is_some() {
                literal.push('%');
                continue;
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            let width = match caps.name("width") {
                Some(w) => w
                    .as_str()
                    .parse::<usize>()
                    .map_err(|_| format!("placeholder width '{}' is too large", w.as_str()))?,
                None => 0,
            };
            segments.push(Segment::Number {
                width,
                zero_pad: caps.name("zero").is_some(),
            });
            placeholders += 1;
        }

        let tail = &pattern[last..];
        if let Some(offset) = tail.find('%') {
            return Err(format!(
                "unsupported '%' sequence at position {}",
                last + offset
            ));
        }
        literal.push_str(tail);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        match placeholders {
            0 => Err("pattern has no numeric placeholder such as %d".to_string()),
            1 => Ok(NumberPattern { segments }),
            n => Err(format!("pattern has {n} numeric placeholders, expected one")),
        }
    }

    /// Render a number through the pattern.
    pub fn render(&self, n: i64) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Number {
                    width,
                    zero_pad: true,
                } => out.push_str(&format!("{n:0width$}")),
                Segment::Number {
                    width,
                    zero_pad: false,
                } => out.push_str(&format!("{n:width$}")),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_padded() {
        let pattern = NumberPattern::parse("INV-%03d").unwrap();
        assert_eq!(pattern.render(1), "INV-001");
        assert_eq!(pattern.render(42), "INV-042");
        assert_eq!(pattern.render(1234), "INV-1234");
    }

    #[test]
    fn test_plain_and_space_padded() {
        assert_eq!(NumberPattern::parse("%d").unwrap().render(7), "7");
        assert_eq!(NumberPattern::parse("No.%4d").unwrap().render(7), "No.   7");
    }

    #[test]
    fn test_literal_percent() {
        let pattern = NumberPattern::parse("%d%% done").unwrap();
        assert_eq!(pattern.render(50), "50% done");
    }

    #[test]
    fn test_rejects_bad_patterns() {
        assert!(NumberPattern::parse("INV-").is_err());
        assert!(NumberPattern::parse("%d-%d").is_err());
        assert!(NumberPattern::parse("%s").is_err());
        assert!(NumberPattern::parse("INV-%03d%").is_err());
    }

    #[test]
    fn test_conversion_regex_is_shared() {
        let first: *const Regex = &*CONVERSION;
        let patterns: Vec<NumberPattern> = (0..3)
            .map(|_| NumberPattern::parse("PL-%04d").unwrap())
            .collect();
        assert!(std::ptr::eq(first, &*CONVERSION));
        assert!(patterns.iter().all(|p| p.render(9) == "PL-0009"));
    }
}
