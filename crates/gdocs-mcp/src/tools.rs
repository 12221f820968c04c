//! Tool registry and dispatch
//!
//! Three read-only tools over the document service: `gdocs_search`,
//! `gdocs_read`, `gdocs_list`. Every call moves through the same
//! lifecycle: received, validated against the declared schema, executed,
//! then completed or failed. Domain failures become `is_error` envelopes
//! carrying the error code and message; only an unknown tool name
//! escapes as a JSON-RPC-level error.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use gdocs_core::convert::Format;
use gdocs_core::{DocumentService, Error};

use crate::protocol::{McpTool, ToolAnnotations, ToolsCallResponse, ToolsListResponse};
use crate::schema::{str_arg, usize_arg, ParamKind, ParamSpec, ToolSpec};

const SEARCH_DEFAULT_MAX: usize = 10;
const LIST_DEFAULT_MAX: usize = 20;

const TOOL_SPECS: &[ToolSpec] = &[
    ToolSpec {
        name: "gdocs_search",
        description: "Search Google Docs, Sheets, and Slides by name and content. Returns document metadata including ids usable with gdocs_read.",
        params: &[
            ParamSpec {
                name: "query",
                kind: ParamKind::NonEmptyString,
                required: true,
                description: "Text to match against document names and body content",
            },
            ParamSpec {
                name: "max_results",
                kind: ParamKind::BoundedInteger,
                required: false,
                description: "Maximum number of results (default 10)",
            },
        ],
    },
    ToolSpec {
        name: "gdocs_read",
        description: "Read a Google Doc, Sheet, or Slides presentation as text. Sheets render as CSV per tab; Slides as one text block per slide.",
        params: &[
            ParamSpec {
                name: "document_id",
                kind: ParamKind::NonEmptyString,
                required: true,
                description: "Drive file id of the document to read",
            },
            ParamSpec {
                name: "format",
                kind: ParamKind::String,
                required: false,
                description: "Output format: markdown (default), text, or html",
            },
        ],
    },
    ToolSpec {
        name: "gdocs_list",
        description: "List Google Docs, Sheets, and Slides in a Drive folder, most recently modified first.",
        params: &[
            ParamSpec {
                name: "folder_id",
                kind: ParamKind::String,
                required: false,
                description: "Drive folder id (default: the Drive root)",
            },
            ParamSpec {
                name: "max_results",
                kind: ParamKind::BoundedInteger,
                required: false,
                description: "Maximum number of results (default 20)",
            },
        ],
    },
];

#[derive(Debug)]
pub enum ToolCallError {
    UnknownTool(String),
}

pub struct ToolRegistry {
    service: Arc<dyn DocumentService>,
}

impl ToolRegistry {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        Self { service }
    }

    pub fn list_response(&self) -> ToolsListResponse {
        let tools = TOOL_SPECS
            .iter()
            .map(|spec| McpTool {
                name: spec.name.to_string(),
                description: spec.description.to_string(),
                input_schema: spec.input_schema(),
                annotations: Some(ToolAnnotations {
                    read_only_hint: Some(true),
                    idempotent_hint: Some(true),
                    open_world_hint: Some(true),
                }),
            })
            .collect();
        ToolsListResponse {
            tools,
            next_cursor: None,
        }
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolsCallResponse, ToolCallError> {
        let Some(spec) = TOOL_SPECS.iter().find(|s| s.name == name) else {
            return Err(ToolCallError::UnknownTool(name.to_string()));
        };
        debug!(tool = name, "Tool call received");

        if let Err(e) = spec.validate(&arguments) {
            warn!(tool = name, error = %e, "Tool call rejected");
            return Ok(ToolsCallResponse::failure(e.code(), &e.to_string()));
        }
        debug!(tool = name, "Tool call validated");

        let result = match name {
            "gdocs_search" => self.search(&arguments).await,
            "gdocs_read" => self.read(&arguments).await,
            "gdocs_list" => self.list(&arguments).await,
            _ => unreachable!("spec lookup already matched"),
        };

        match result {
            Ok(payload) => {
                info!(tool = name, "Tool call completed");
                Ok(ToolsCallResponse::text(&payload))
            }
            Err(e) => {
                warn!(tool = name, code = e.code(), error = %e, "Tool call failed");
                Ok(ToolsCallResponse::failure(e.code(), &e.to_string()))
            }
        }
    }

    async fn search(&self, arguments: &Value) -> Result<Value, Error> {
        let query = str_arg(arguments, "query").unwrap_or_default();
        let max_results = usize_arg(arguments, "max_results", SEARCH_DEFAULT_MAX);
        let results = self.service.search(query, max_results).await?;
        Ok(json!({"count": results.len(), "results": results}))
    }

    async fn read(&self, arguments: &Value) -> Result<Value, Error> {
        // Parse the format before touching the network: a bad format must
        // fail without spending a remote call.
        let format = match str_arg(arguments, "format") {
            Some(raw) => Format::parse(raw)?,
            None => Format::Markdown,
        };
        let document_id = str_arg(arguments, "document_id").unwrap_or_default();

        let content = self.service.read(document_id, format).await?;
        Ok(json!({
            "id": content.metadata.id,
            "title": content.metadata.title,
            "kind": content.metadata.kind.as_str(),
            "modified": content.metadata.modified,
            "url": content.metadata.url,
            "format": format.as_str(),
            "content": content.text,
        }))
    }

    async fn list(&self, arguments: &Value) -> Result<Value, Error> {
        let folder_id = str_arg(arguments, "folder_id");
        let max_results = usize_arg(arguments, "max_results", LIST_DEFAULT_MAX);
        let documents = self.service.list(folder_id, max_results).await?;
        Ok(json!({"count": documents.len(), "documents": documents}))
    }
}
