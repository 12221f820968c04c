//! Drive API v3 client
//!
//! Search and listing over the user's Drive, restricted to Google
//! Workspace document types (Docs, Sheets, Slides), plus per-file
//! metadata lookup.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::client::GoogleClient;
use crate::error::{Error, Result};

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const METADATA_FIELDS: &str = "id, name, mimeType, modifiedTime, parents, webViewLink";
/// Listing order: most recently modified first.
const LIST_ORDER: &str = "modifiedTime desc";

pub const MIME_DOCUMENT: &str = "application/vnd.google-apps.document";
pub const MIME_SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
pub const MIME_PRESENTATION: &str = "application/vnd.google-apps.presentation";

/// The three Workspace document kinds this server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    Document,
    Spreadsheet,
    Presentation,
}

impl DocKind {
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            MIME_DOCUMENT => Some(DocKind::Document),
            MIME_SPREADSHEET => Some(DocKind::Spreadsheet),
            MIME_PRESENTATION => Some(DocKind::Presentation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Document => "document",
            DocKind::Spreadsheet => "spreadsheet",
            DocKind::Presentation => "presentation",
        }
    }
}

/// Immutable metadata snapshot, fetched per request and never cached.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentMetadata {
    pub id: String,
    pub title: String,
    pub mime_type: String,
    /// Friendly kind name; "file" for anything outside the Workspace types.
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub modified: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_folder_id: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl DocumentMetadata {
    /// Build from a Drive `files` resource; `None` if the id or name is
    /// missing (a malformed entry is skipped, not fatal).
    fn from_value(file: &Value) -> Option<Self> {
        let id = file.get("id")?.as_str()?.to_string();
        let title = file.get("name")?.as_str()?.to_string();
        let mime_type = file
            .get("mimeType")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let kind = DocKind::from_mime(&mime_type)
            .map(|k| k.as_str())
            .unwrap_or("file")
            .to_string();

        Some(Self {
            id,
            title,
            kind,
            modified: file
                .get("modifiedTime")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            parent_folder_id: file
                .get("parents")
                .and_then(|v| v.as_array())
                .and_then(|parents| parents.first())
                .and_then(|v| v.as_str())
                .map(String::from),
            url: file
                .get("webViewLink")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            mime_type,
        })
    }
}

pub struct DriveApi {
    client: GoogleClient,
}

super::google_api_wrapper!(DriveApi);

impl DriveApi {
    /// Full-text and name search across Workspace documents.
    ///
    /// An unmatched query yields an empty vec, never an error.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<DocumentMetadata>> {
        info!(query, max_results, "Searching Drive");

        let escaped = escape_query(query);
        let q = format!(
            "({}) and (name contains '{}' or fullText contains '{}')",
            workspace_mime_filter(),
            escaped,
            escaped
        );
        // Drive ignores orderBy when the query uses fullText.
        self.files_list(&q, None, max_results).await
    }

    /// List Workspace documents that are children of `folder_id`, or of
    /// the Drive root when omitted. Most recently modified first.
    pub async fn list(
        &self,
        folder_id: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<DocumentMetadata>> {
        info!(folder = folder_id.unwrap_or("root"), max_results, "Listing Drive folder");

        let parent = folder_id.map(escape_query).unwrap_or_else(|| "root".to_string());
        let q = format!("({}) and '{}' in parents", workspace_mime_filter(), parent);
        self.files_list(&q, Some(LIST_ORDER), max_results).await
    }

    /// Metadata for a single file.
    pub async fn metadata(&self, document_id: &str) -> Result<DocumentMetadata> {
        debug!(document_id, "Fetching file metadata");

        let url = format!("{}/files/{}", DRIVE_API_BASE, document_id);
        let query = [("fields", METADATA_FIELDS.to_string())];
        let response = self.client.get(&url, &query).await?;

        DocumentMetadata::from_value(&response).ok_or_else(|| {
            Error::Internal("metadata response missing id or name".to_string())
        })
    }

    async fn files_list(
        &self,
        q: &str,
        order_by: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<DocumentMetadata>> {
        let url = format!("{}/files", DRIVE_API_BASE);
        let query = file_list_params(q, order_by, max_results);

        let response = self.client.get(&url, &query).await?;
        let results = parse_file_list_capped(&response, max_results);

        debug!(count = results.len(), "Drive query returned");
        Ok(results)
    }
}

/// Query parameters for a `files.list` call.
fn file_list_params(q: &str, order_by: Option<&str>, max_results: usize) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("q", q.to_string()),
        ("pageSize", max_results.to_string()),
        ("fields", format!("files({})", METADATA_FIELDS)),
    ];
    if let Some(order) = order_by {
        params.push(("orderBy", order.to_string()));
    }
    params
}

/// Restrict queries to the three Workspace document MIME types.
fn workspace_mime_filter() -> String {
    [MIME_DOCUMENT, MIME_SPREADSHEET, MIME_PRESENTATION]
        .iter()
        .map(|mime| format!("mimeType='{}'", mime))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Escape a value for embedding in a Drive query string literal.
fn escape_query(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

fn parse_file_list(response: &Value) -> Vec<DocumentMetadata> {
    response
        .get("files")
        .and_then(|v| v.as_array())
        .map(|files| files.iter().filter_map(DocumentMetadata::from_value).collect())
        .unwrap_or_default()
}

/// Parse and cap: the bound holds even when the server over-delivers
/// past `pageSize`.
fn parse_file_list_capped(response: &Value, max_results: usize) -> Vec<DocumentMetadata> {
    let mut results = parse_file_list(response);
    results.truncate(max_results);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_doc_kind_from_mime() {
        assert_eq!(DocKind::from_mime(MIME_DOCUMENT), Some(DocKind::Document));
        assert_eq!(DocKind::from_mime(MIME_SPREADSHEET), Some(DocKind::Spreadsheet));
        assert_eq!(DocKind::from_mime(MIME_PRESENTATION), Some(DocKind::Presentation));
        assert_eq!(DocKind::from_mime("application/pdf"), None);
    }

    #[test]
    fn test_escape_query() {
        assert_eq!(escape_query("plain"), "plain");
        assert_eq!(escape_query("o'brien"), "o\\'brien");
        assert_eq!(escape_query("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_mime_filter_covers_all_kinds() {
        let filter = workspace_mime_filter();
        assert!(filter.contains(MIME_DOCUMENT));
        assert!(filter.contains(MIME_SPREADSHEET));
        assert!(filter.contains(MIME_PRESENTATION));
        assert_eq!(filter.matches(" or ").count(), 2);
    }

    #[test]
    fn test_parse_file_list() {
        let response = json!({
            "files": [
                {
                    "id": "doc1",
                    "name": "Q3 Planning",
                    "mimeType": MIME_DOCUMENT,
                    "modifiedTime": "2026-08-01T10:00:00Z",
                    "parents": ["folder9"],
                    "webViewLink": "https://docs.google.com/document/d/doc1"
                },
                {
                    "id": "sheet1",
                    "name": "Budget",
                    "mimeType": MIME_SPREADSHEET
                }
            ]
        });

        let results = parse_file_list(&response);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "doc1");
        assert_eq!(results[0].kind, "document");
        assert_eq!(results[0].parent_folder_id.as_deref(), Some("folder9"));
        assert_eq!(results[1].kind, "spreadsheet");
        assert!(results[1].modified.is_empty());
    }

    #[test]
    fn test_parse_file_list_skips_malformed_entries() {
        let response = json!({
            "files": [
                { "name": "no id here" },
                { "id": "ok", "name": "Fine", "mimeType": MIME_DOCUMENT }
            ]
        });
        let results = parse_file_list(&response);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "ok");
    }

    #[test]
    fn test_parse_file_list_empty_response() {
        assert!(parse_file_list(&json!({})).is_empty());
        assert!(parse_file_list(&json!({"files": []})).is_empty());
    }

    #[test]
    fn test_list_params_request_most_recent_first() {
        let params = file_list_params("q", Some(LIST_ORDER), 10);
        assert!(params.contains(&("orderBy", "modifiedTime desc".to_string())));
        assert!(params.contains(&("pageSize", "10".to_string())));
    }

    #[test]
    fn test_search_params_carry_no_ordering() {
        let params = file_list_params("q", None, 10);
        assert!(params.iter().all(|(key, _)| *key != "orderBy"));
    }

    #[test]
    fn test_results_capped_at_max_results() {
        let files: Vec<Value> = (0..5)
            .map(|i| {
                json!({
                    "id": format!("d{}", i),
                    "name": format!("Doc {}", i),
                    "mimeType": MIME_DOCUMENT
                })
            })
            .collect();
        let response = json!({"files": files});

        // over-delivering response is capped
        assert_eq!(parse_file_list_capped(&response, 3).len(), 3);
        assert_eq!(parse_file_list_capped(&response, 5).len(), 5);
        // fewer available than requested: all of them, no padding
        assert_eq!(parse_file_list_capped(&response, 20).len(), 5);
    }
}
