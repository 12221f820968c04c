//! Format converter
//!
//! Maps the native JSON of a Workspace document onto plain text. Docs
//! honor the requested target format (markdown, text, or minimal HTML);
//! spreadsheets always render as per-tab CSV blocks and presentations as
//! per-slide text blocks. Embedded objects become placeholder tokens —
//! never silently dropped, never decoded.

pub mod document;
pub mod presentation;
pub mod spreadsheet;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::google::drive::DocKind;

/// Recognized target formats for `gdocs_read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Markdown,
    Text,
    Html,
}

impl Format {
    /// Parse the `format` tool parameter. Anything unrecognized is an
    /// `UnsupportedFormat` error naming the accepted values.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "markdown" => Ok(Format::Markdown),
            "text" => Ok(Format::Text),
            "html" => Ok(Format::Html),
            other => Err(Error::UnsupportedFormat(format!(
                "'{}' is not a recognized format (expected markdown, text, or html)",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Markdown => "markdown",
            Format::Text => "text",
            Format::Html => "html",
        }
    }
}

/// Convert native content to text according to the document kind.
pub fn convert(raw: &Value, kind: DocKind, format: Format) -> Result<String> {
    match kind {
        DocKind::Document => document::render(raw, format),
        DocKind::Spreadsheet => spreadsheet::render(raw),
        DocKind::Presentation => presentation::render(raw),
    }
}

/// Placeholder token for an embedded object the converter will not decode.
pub(crate) fn placeholder(kind: &str, id: &str) -> String {
    if id.is_empty() {
        format!("[{}]", kind)
    } else {
        format!("[{}: {}]", kind, id)
    }
}
