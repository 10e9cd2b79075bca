use crate::records::decode::{self, RawRecord};
use crate::records::Edition;
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Filename marker identifying a digital release
const DIGITAL_MARKER: &str = "(digital)";

/// One downloadable file, optionally linked to its edition
///
/// Files found through an unsorted search carry no edition.
#[derive(Debug, Clone, Serialize)]
pub struct ResultFile {
    pub id: u64,
    #[serde(skip)]
    pub edition: Option<Arc<Edition>>,
    #[serde(flatten)]
    pub state: FileState,
    #[serde(skip)]
    raw: RawRecord,
}

/// Whether the catalog still considers the file downloadable
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileState {
    /// No longer downloadable; carries no other data
    Broken,
    Available(FileDetails),
}

/// Fields of a file that is not broken
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileDetails {
    pub md5: Option<String>,
    pub download_url: Option<String>,
    pub filename: Option<String>,
    pub filesize: Option<u64>,
    pub pages: Option<u32>,
    pub extension: Option<String>,
    pub releaser: Option<String>,
    pub scan_type: Option<String>,
    pub resolution: Option<String>,
    pub dpi: Option<String>,
    pub time_created: Option<NaiveDateTime>,
    pub time_added: Option<NaiveDateTime>,
    pub time_last_modified: Option<NaiveDateTime>,
}

impl ResultFile {
    /// Decodes a file record
    ///
    /// A file is broken unless its `broken` field is exactly `"N"`.
    pub fn decode(raw: RawRecord, site_url: &str, edition: Option<Arc<Edition>>) -> Self {
        let fields = &raw.fields;

        let state = if decode::text(fields, "broken").as_deref() != Some("N") {
            FileState::Broken
        } else {
            let md5 = decode::text(fields, "md5");
            let download_url = md5
                .as_ref()
                .map(|md5| format!("{}/get.php?md5={}", site_url, md5));
            let filename = decode::text(fields, "locator")
                .and_then(|locator| locator.rsplit('\\').next().map(str::to_string))
                .filter(|name| !name.is_empty());

            let mut details = FileDetails {
                md5,
                download_url,
                filename,
                filesize: decode::unsigned(fields, "filesize"),
                pages: decode::unsigned(fields, "archive_files_pic_count")
                    .and_then(|v| u32::try_from(v).ok()),
                extension: decode::text(fields, "extension"),
                releaser: decode::text(fields, "releaser"),
                scan_type: decode::text(fields, "scan_type"),
                resolution: decode::text(fields, "scan_size"),
                dpi: decode::text(fields, "dpi"),
                time_created: decode::timestamp(fields, "file_create_date"),
                time_added: decode::timestamp(fields, "time_added"),
                time_last_modified: decode::timestamp(fields, "time_last_modified"),
            };
            infer_digital_release(&mut details);

            FileState::Available(details)
        };

        Self {
            id: raw.id,
            edition,
            state,
            raw,
        }
    }

    /// Looks up a raw field of the decoded object
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    pub fn is_broken(&self) -> bool {
        matches!(self.state, FileState::Broken)
    }

    /// Returns the file's fields, or None if it is broken
    pub fn details(&self) -> Option<&FileDetails> {
        match &self.state {
            FileState::Broken => None,
            FileState::Available(details) => Some(details),
        }
    }
}

/// Fills scan type and releaser from a `(Digital)` filename
///
/// Only missing values are filled. The releaser is the parenthesized group
/// right before the extension, or the one right before the digital marker
/// when the marker comes last. Bare years are never taken as a releaser.
fn infer_digital_release(details: &mut FileDetails) {
    if details.scan_type.is_some() {
        return;
    }
    let Some(filename) = details.filename.as_deref() else {
        return;
    };
    if !filename.to_lowercase().contains(DIGITAL_MARKER) {
        return;
    }

    details.scan_type = Some("digital".to_string());

    if details.releaser.is_none() {
        details.releaser = releaser_from_filename(filename);
    }
}

fn releaser_from_filename(filename: &str) -> Option<String> {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _extension)) => stem,
        None => filename,
    };

    let (rest, last) = trailing_group(stem)?;
    let candidate = if is_digital_marker(last) {
        trailing_group(rest)?.1
    } else {
        last
    };

    let candidate = candidate.trim();
    if candidate.is_empty()
        || is_digital_marker(candidate)
        || candidate.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    Some(candidate.to_string())
}

/// Splits `"... (group)"` into the text before the group and the group's content
fn trailing_group(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_end();
    let inner = text.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    Some((&inner[..open], &inner[open + 1..]))
}

fn is_digital_marker(group: &str) -> bool {
    format!("({})", group.trim()).eq_ignore_ascii_case(DIGITAL_MARKER)
}
