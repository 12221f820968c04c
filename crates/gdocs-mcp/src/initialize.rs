use crate::protocol::{
    InitializeRequest, InitializeResponse, MCP_PROTOCOL_VERSION, ServerCapabilities, ServerInfo,
    ToolsCapabilities,
};

pub fn handle_initialize(_request: InitializeRequest) -> InitializeResponse {
    InitializeResponse {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: ToolsCapabilities {
                list_changed: false,
            },
        },
        server_info: ServerInfo {
            name: "gdocs-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        instructions: "Read-only access to Google Docs, Sheets, and Slides. Use gdocs_search to find documents, gdocs_list to browse a folder, and gdocs_read to fetch content as markdown, text, or html. If calls fail with an authentication error, the user must run `gdocs-mcp login` in a terminal.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ClientInfo;

    #[test]
    fn test_initialize_declares_server_version() {
        let response = handle_initialize(InitializeRequest {
            protocol_version: "2024-11-05".to_string(),
            capabilities: serde_json::json!({}),
            client_info: ClientInfo {
                name: "test-client".to_string(),
                version: "0.0.1".to_string(),
            },
        });

        // server declares its own version regardless of the client's
        assert_eq!(response.protocol_version, MCP_PROTOCOL_VERSION);
        assert_eq!(response.server_info.name, "gdocs-mcp");
        assert!(!response.capabilities.tools.list_changed);
    }
}
