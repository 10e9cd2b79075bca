use crate::records::decode::{self, PartialDate, RawRecord};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

/// Added-key code the catalog uses for a series' language
const LANGUAGE_KEY: &str = "101";

/// One cataloged comic series
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub id: u64,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub start: PartialDate,
    pub end: PartialDate,
    /// Reference URL on the metadata provider, when the catalog links one
    pub external_url: Option<String>,
    pub time_added: Option<NaiveDateTime>,
    pub time_last_modified: Option<NaiveDateTime>,
    /// Ids of the editions belonging to this series
    pub edition_ids: Vec<u64>,
    #[serde(skip)]
    raw: RawRecord,
}

impl Series {
    /// Decodes a series record
    ///
    /// The external URL is the first added value starting with
    /// `external_url_prefix`.
    pub fn decode(raw: RawRecord, external_url_prefix: &str) -> Self {
        let fields = &raw.fields;

        let mut language = None;
        let mut external_url = None;

        for added in added_values(raw.get("add")) {
            let key = decode::text(added, "key");
            let Some(value) = decode::text(added, "value") else {
                continue;
            };

            if key.as_deref() == Some(LANGUAGE_KEY) {
                language = Some(value);
            } else if external_url.is_none() && value.starts_with(external_url_prefix) {
                external_url = Some(value);
            }
        }

        Self {
            id: raw.id,
            title: decode::text(fields, "title"),
            publisher: decode::text(fields, "publisher"),
            language,
            start: decode::partial_date(fields, "date_start"),
            end: decode::partial_date(fields, "date_end"),
            external_url,
            time_added: decode::timestamp(fields, "time_added"),
            time_last_modified: decode::timestamp(fields, "time_last_modified"),
            edition_ids: decode::child_ids(fields, "editions", None),
            raw,
        }
    }

    /// Looks up a raw field of the decoded object
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Sets the external URL when the catalog record carries none
    pub fn with_default_external_url(mut self, url: Option<&str>) -> Self {
        if self.external_url.is_none() {
            self.external_url = url.map(str::to_string);
        }
        self
    }

    /// Returns true if this series is the one the query is looking for
    ///
    /// A series with an external URL matches only on exact URL equality. A
    /// series without one matches on start year, and only when both years
    /// are known.
    pub fn matches(&self, expected_url: &str, expected_start_year: Option<i32>) -> bool {
        match &self.external_url {
            Some(url) => url == expected_url,
            None => match (self.start.year, expected_start_year) {
                (Some(year), Some(expected)) => year == expected,
                _ => false,
            },
        }
    }
}

/// Iterates the objects under the `add` field, which may be a map or a list
fn added_values(add: Option<&Value>) -> Box<dyn Iterator<Item = &serde_json::Map<String, Value>> + '_> {
    match add {
        Some(Value::Object(map)) => Box::new(map.values().filter_map(Value::as_object)),
        Some(Value::Array(list)) => Box::new(list.iter().filter_map(Value::as_object)),
        _ => Box::new(std::iter::empty()),
    }
}
