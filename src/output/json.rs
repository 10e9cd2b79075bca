use crate::records::{Edition, ResultFile};
use serde::Serialize;

/// Serialized form of one file with its edition context
#[derive(Debug, Serialize)]
pub struct FileView<'a> {
    #[serde(flatten)]
    pub file: &'a ResultFile,
    pub edition: Option<&'a Edition>,
    pub series_title: Option<&'a str>,
}

impl<'a> From<&'a ResultFile> for FileView<'a> {
    fn from(file: &'a ResultFile) -> Self {
        let edition = file.edition.as_deref();
        Self {
            file,
            edition,
            series_title: edition.and_then(|e| e.series.title.as_deref()),
        }
    }
}

/// Formats files as a pretty-printed JSON array
pub fn format_json(files: &[ResultFile]) -> serde_json::Result<String> {
    let views: Vec<FileView<'_>> = files.iter().map(FileView::from).collect();
    serde_json::to_string_pretty(&views)
}
