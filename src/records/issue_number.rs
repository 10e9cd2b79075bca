//! Issue number parsing and matching
//!
//! Catalog issue numbers are free text. A comma is a decimal separator
//! (`"34,2"` is 34.2) and a hyphen separates the two ends of a combined issue
//! (`"13-14"`). Anything else that fails to parse is unknown.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A parsed issue number: a single value or an inclusive range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IssueNumber {
    Single(f64),
    Range(f64, f64),
}

impl IssueNumber {
    /// Parses catalog issue-number text, returning None for unknown values
    ///
    /// A leading hyphen is a sign, not a range separator, so `"-1"` is the
    /// single value -1.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let normalized = text.replace(',', ".");

        // Skip the first character so a leading sign is not taken as a separator
        let split_at = normalized
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '-')
            .map(|(i, _)| i);

        match split_at {
            Some(i) => {
                let low = parse_component(&normalized[..i])?;
                let high = parse_component(&normalized[i + 1..])?;
                Some(Self::Range(low, high))
            }
            None => parse_component(&normalized).map(Self::Single),
        }
    }

    /// Returns the inclusive bounds of this number, lowest first
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            Self::Single(value) => (value, value),
            Self::Range(a, b) if a <= b => (a, b),
            Self::Range(a, b) => (b, a),
        }
    }

    /// Returns true if an edition numbered `self` satisfies a request for `target`
    ///
    /// Two single values must be equal. A single value matches a range when it
    /// lies within the range's inclusive bounds, whichever side the range is
    /// on. Two ranges must have the same bounds.
    pub fn matches(&self, target: &IssueNumber) -> bool {
        match (self, target) {
            (Self::Single(a), Self::Single(b)) => a == b,
            (Self::Range(..), Self::Single(value)) | (Self::Single(value), Self::Range(..)) => {
                let (low, high) = if matches!(self, Self::Range(..)) {
                    self.bounds()
                } else {
                    target.bounds()
                };
                low <= *value && *value <= high
            }
            (Self::Range(..), Self::Range(..)) => self.bounds() == target.bounds(),
        }
    }
}

fn parse_component(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => write!(f, "{}", value),
            Self::Range(low, high) => write!(f, "{}-{}", low, high),
        }
    }
}

impl FromStr for IssueNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("'{}' is not an issue number or range", s))
    }
}
