//! Native content fetchers
//!
//! Structured-JSON `get` endpoints for the three Workspace document
//! kinds. The converter consumes these payloads as-is; nothing here
//! interprets document structure.

use serde_json::Value;
use tracing::info;

use super::client::GoogleClient;
use crate::error::Result;

const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
const SLIDES_API_BASE: &str = "https://slides.googleapis.com/v1";

pub struct DocsApi {
    client: GoogleClient,
}

super::google_api_wrapper!(DocsApi);

impl DocsApi {
    /// `documents.get` — full document body.
    pub async fn get_document(&self, document_id: &str) -> Result<Value> {
        info!(document_id, "Fetching document content");
        let url = format!("{}/documents/{}", DOCS_API_BASE, document_id);
        self.client.get_content(&url, &[]).await
    }
}

pub struct SheetsApi {
    client: GoogleClient,
}

super::google_api_wrapper!(SheetsApi);

impl SheetsApi {
    /// `spreadsheets.get` with grid data, trimmed to the fields the
    /// converter reads (titles, formatted cell values, chart ids).
    pub async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Value> {
        info!(spreadsheet_id, "Fetching spreadsheet content");
        let url = format!("{}/spreadsheets/{}", SHEETS_API_BASE, spreadsheet_id);
        let query = [
            ("includeGridData", "true".to_string()),
            (
                "fields",
                "sheets(properties(title,index),data(rowData(values(formattedValue))),charts(chartId))"
                    .to_string(),
            ),
        ];
        self.client.get_content(&url, &query).await
    }
}

pub struct SlidesApi {
    client: GoogleClient,
}

super::google_api_wrapper!(SlidesApi);

impl SlidesApi {
    /// `presentations.get` — all slides with their page elements.
    pub async fn get_presentation(&self, presentation_id: &str) -> Result<Value> {
        info!(presentation_id, "Fetching presentation content");
        let url = format!("{}/presentations/{}", SLIDES_API_BASE, presentation_id);
        self.client.get_content(&url, &[]).await
    }
}
