//! Output formatting for resolved files
//!
//! This module handles:
//! - The JSON shape of a result list, each file carrying its edition
//! - A human-readable markdown table

mod json;
mod markdown;

pub use json::{format_json, FileView};
pub use markdown::format_markdown;

use std::str::FromStr;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}
