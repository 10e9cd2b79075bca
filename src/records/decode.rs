//! Field decoders for catalog JSON objects
//!
//! Only [`parse_envelope`] can fail. Every field decoder is total: a missing,
//! empty or malformed field decodes to `None` so one bad field never aborts
//! the rest of the record.

use crate::records::IssueNumber;
use crate::CatalogError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

/// One catalog object as returned by the object API, keyed by its id
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: u64,
    pub fields: Map<String, Value>,
}

impl RawRecord {
    /// Looks up a raw field by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// A calendar date whose components may each be unknown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartialDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

/// Parses an object API response of the shape `{ "<id>": { ...fields... } }`
///
/// An empty object or empty array (the catalog's answer for unknown ids)
/// yields no records. Any other shape means the upstream contract changed
/// and is reported as [`CatalogError::MalformedPayload`].
pub fn parse_envelope(url: &str, body: &str) -> Result<Vec<RawRecord>, CatalogError> {
    let malformed = |message: String| CatalogError::MalformedPayload {
        url: url.to_string(),
        message,
    };

    let value: Value =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;

    let envelope = match value {
        Value::Object(map) => map,
        Value::Array(items) if items.is_empty() => return Ok(Vec::new()),
        other => {
            return Err(malformed(format!(
                "expected an object keyed by id, got {}",
                json_kind(&other)
            )))
        }
    };

    envelope
        .into_iter()
        .map(|(key, value)| {
            let id = key
                .trim()
                .parse::<u64>()
                .map_err(|_| malformed(format!("record key '{}' is not an id", key)))?;
            match value {
                Value::Object(fields) => Ok(RawRecord { id, fields }),
                other => Err(malformed(format!(
                    "record {} is {}, not an object",
                    id,
                    json_kind(&other)
                ))),
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decodes a non-empty text field; numbers are rendered as text
pub fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decodes an integer from a JSON number or a numeric string
pub fn integer(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decodes a non-negative integer
pub fn unsigned(fields: &Map<String, Value>, key: &str) -> Option<u64> {
    integer(fields, key).and_then(|v| u64::try_from(v).ok())
}

/// Decodes an ISO-8601 timestamp
///
/// Accepts a space or `T` separator, optional fractional seconds, a bare
/// date, and RFC 3339 offsets (converted to UTC).
pub fn timestamp(fields: &Map<String, Value>, key: &str) -> Option<NaiveDateTime> {
    match fields.get(key)? {
        Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

/// Parses timestamp text, see [`timestamp`]
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Decodes an issue number, see [`IssueNumber::parse`]
pub fn issue_number(fields: &Map<String, Value>, key: &str) -> Option<IssueNumber> {
    match fields.get(key)? {
        Value::String(s) => IssueNumber::parse(s),
        Value::Number(n) => n.as_f64().map(IssueNumber::Single),
        _ => None,
    }
}

/// Decodes a `YYYY-MM-DD` date whose components may be zero (unknown)
pub fn partial_date(fields: &Map<String, Value>, key: &str) -> PartialDate {
    let Some(Value::String(s)) = fields.get(key) else {
        return PartialDate::default();
    };

    let mut parts = s.trim().splitn(3, '-');
    let mut next = || {
        parts
            .next()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|&v| v != 0)
    };

    let year = next().and_then(|y| i32::try_from(y).ok());
    let month = next().filter(|m| *m <= 12);
    let day = next().filter(|d| *d <= 31);

    PartialDate { year, month, day }
}

/// Collects child ids from a relationship mapping such as `editions` or `files`
///
/// The mapping is an object keyed by child id (or an array of children). When
/// `inner_key` is given and a child carries it, that value is the id;
/// otherwise the object key is. A missing or empty mapping yields no ids.
pub fn child_ids(fields: &Map<String, Value>, key: &str, inner_key: Option<&str>) -> Vec<u64> {
    let inner = |child: &Value| -> Option<u64> {
        let child = child.as_object()?;
        unsigned(child, inner_key?)
    };

    match fields.get(key) {
        Some(Value::Object(children)) => children
            .iter()
            .filter_map(|(k, child)| inner(child).or_else(|| k.trim().parse().ok()))
            .collect(),
        Some(Value::Array(children)) => children.iter().filter_map(inner).collect(),
        _ => Vec::new(),
    }
}
