use crate::records::decode::{self, RawRecord};
use crate::records::{IssueNumber, Series};
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;

/// One published issue or volume of a series
#[derive(Debug, Clone, Serialize)]
pub struct Edition {
    pub id: u64,
    /// The owning series; serialized as its id
    #[serde(rename = "series_id", serialize_with = "serialize_series_id")]
    pub series: Arc<Series>,
    pub number: Option<IssueNumber>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub cover_url: Option<String>,
    pub year: Option<i32>,
    pub month: Option<String>,
    pub day: Option<u32>,
    pub pages: Option<u32>,
    pub time_added: Option<NaiveDateTime>,
    pub time_last_modified: Option<NaiveDateTime>,
    /// Ids of the files attached to this edition
    pub file_ids: Vec<u64>,
    #[serde(skip)]
    raw: RawRecord,
}

impl Edition {
    /// Decodes an edition record belonging to `series`
    pub fn decode(raw: RawRecord, series: Arc<Series>) -> Self {
        let fields = &raw.fields;

        Self {
            id: raw.id,
            series,
            number: decode::issue_number(fields, "issue_total_number"),
            title: decode::text(fields, "title"),
            author: decode::text(fields, "author"),
            publisher: decode::text(fields, "publisher"),
            cover_url: decode::text(fields, "cover_url"),
            year: decode::integer(fields, "year").and_then(|v| i32::try_from(v).ok()),
            month: decode::text(fields, "month"),
            day: decode::unsigned(fields, "day").and_then(|v| u32::try_from(v).ok()),
            pages: decode::unsigned(fields, "pages").and_then(|v| u32::try_from(v).ok()),
            time_added: decode::timestamp(fields, "time_added"),
            time_last_modified: decode::timestamp(fields, "time_last_modified"),
            file_ids: decode::child_ids(fields, "files", Some("f_id")),
            raw,
        }
    }

    /// Looks up a raw field of the decoded object
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Returns true if this edition satisfies the requested issue number
    ///
    /// Editions with an unknown number never match.
    pub fn matches_issue(&self, target: &IssueNumber) -> bool {
        self.number.is_some_and(|number| number.matches(target))
    }
}

fn serialize_series_id<S: Serializer>(series: &Arc<Series>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(series.id)
}
