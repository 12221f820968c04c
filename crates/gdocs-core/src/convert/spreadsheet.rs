//! Google Sheets rendering
//!
//! Each sheet tab becomes one block: a header line naming the tab,
//! followed by the grid as CSV rows built from formatted cell values.
//! Embedded charts are recorded as placeholder lines.

use serde_json::Value;

use super::placeholder;
use crate::error::{Error, Result};

pub fn render(spreadsheet: &Value) -> Result<String> {
    let sheets = spreadsheet
        .get("sheets")
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::Conversion("spreadsheet has no sheets".to_string()))?;

    let mut blocks = Vec::with_capacity(sheets.len());
    for (index, sheet) in sheets.iter().enumerate() {
        blocks.push(render_sheet(sheet, index));
    }

    Ok(blocks.join("\n"))
}

fn render_sheet(sheet: &Value, index: usize) -> String {
    let title = sheet
        .pointer("/properties/title")
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| format!("Sheet{}", index + 1));

    let mut block = format!("--- Sheet: {} ---\n", title);

    // Grid data arrives as one or more ranges; the full-grid fetch uses one.
    if let Some(ranges) = sheet.get("data").and_then(|v| v.as_array()) {
        for range in ranges {
            if let Some(rows) = range.get("rowData").and_then(|v| v.as_array()) {
                for row in rows {
                    block.push_str(&csv_row(row));
                    block.push('\n');
                }
            }
        }
    }

    if let Some(charts) = sheet.get("charts").and_then(|v| v.as_array()) {
        for chart in charts {
            let id = chart
                .get("chartId")
                .map(|v| v.to_string())
                .unwrap_or_default();
            block.push_str(&placeholder("chart", &id));
            block.push('\n');
        }
    }

    block
}

fn csv_row(row: &Value) -> String {
    row.get("values")
        .and_then(|v| v.as_array())
        .map(|cells| {
            cells
                .iter()
                .map(|cell| {
                    let raw = cell
                        .get("formattedValue")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    csv_field(raw)
                })
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default()
}

/// RFC-4180-style quoting: fields containing a comma, quote, or newline
/// are wrapped in double quotes with inner quotes doubled.
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
