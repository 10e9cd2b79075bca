//! Markdown table generation
//!
//! Renders resolved files as a table grouped by series, one row per file.

use crate::records::ResultFile;

/// Formats files as a markdown document
///
/// # Arguments
///
/// * `query` - The search text, used as the title
/// * `files` - The resolved files, in resolution order
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown(query: &str, files: &[ResultFile]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Files for '{}'\n\n", escape(query)));
    md.push_str(&format!("- **Files**: {}\n", files.len()));
    let unsorted = files.iter().filter(|f| f.edition.is_none()).count();
    md.push_str(&format!("- **Unsorted**: {}\n\n", unsorted));

    if files.is_empty() {
        md.push_str("No files found.\n");
        return md;
    }

    md.push_str("| Series | Issue | Filename | Size | Pages | Releaser | Download |\n");
    md.push_str("|--------|-------|----------|------|-------|----------|----------|\n");

    for file in files {
        let Some(details) = file.details() else {
            continue;
        };

        let edition = file.edition.as_deref();
        let series = edition
            .and_then(|e| e.series.title.as_deref())
            .unwrap_or("(unsorted)");
        let issue = edition
            .and_then(|e| e.number)
            .map(|n| n.to_string())
            .unwrap_or_default();
        let size = details.filesize.map(format_size).unwrap_or_default();
        let pages = details.pages.map(|p| p.to_string()).unwrap_or_default();
        let link = details
            .download_url
            .as_deref()
            .map(|url| format!("[get]({})", url))
            .unwrap_or_default();

        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            escape(series),
            issue,
            escape(details.filename.as_deref().unwrap_or("")),
            size,
            pages,
            escape(details.releaser.as_deref().unwrap_or("")),
            link
        ));
    }

    md
}

/// Escapes pipe characters so cell text cannot break the table
fn escape(text: &str) -> String {
    text.replace('|', "\\|")
}

fn format_size(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    format!("{:.1} MiB", bytes as f64 / MIB)
}
