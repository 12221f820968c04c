mod initialize;
mod protocol;
mod schema;
mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gdocs_core::auth::flow::run_consent_flow;
use gdocs_core::auth::provider::GoogleProvider;
use gdocs_core::auth::{CredentialStore, TokenRefresher};
use gdocs_core::{Config, DocumentService, GoogleWorkspaceService};

use protocol::{
    error, success, InitializeRequest, JsonRpcRequest, JsonRpcResponse, ToolsCallRequest,
};
use tools::{ToolCallError, ToolRegistry};

#[derive(Parser, Debug)]
#[command(name = "gdocs-mcp", version, about = "MCP server for read-only Google Docs, Sheets, and Slides access")]
struct Cli {
    /// Config file path (default: ~/.gdocs-mcp/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server (the default when no subcommand is given).
    Serve {
        #[arg(long, default_value = "stdio")]
        transport: String,
    },
    /// Authorize a Google account in the browser and store its tokens.
    Login {
        #[arg(long)]
        account: Option<String>,
    },
    /// Revoke and delete the stored tokens for an account.
    Logout {
        #[arg(long)]
        account: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve {
        transport: "stdio".to_string(),
    }) {
        Command::Serve { transport } => {
            if transport != "stdio" {
                anyhow::bail!("only stdio transport is supported");
            }
            serve(config).await
        }
        Command::Login { account } => login(config, account).await,
        Command::Logout { account } => logout(config, account).await,
    }
}

fn is_notification(method: &str) -> bool {
    method.starts_with("notifications/")
}

fn build_auth(config: &Config) -> anyhow::Result<(Arc<GoogleProvider>, Arc<CredentialStore>)> {
    let provider = Arc::new(GoogleProvider::new(
        config.client_id.clone(),
        config.client_secret.clone(),
    )?);
    let refresher: Arc<dyn TokenRefresher> = Arc::clone(&provider) as Arc<dyn TokenRefresher>;
    let store = Arc::new(CredentialStore::new(&config.data_dir()?, refresher)?);
    Ok((provider, store))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let (_provider, store) = build_auth(&config)?;
    let service: Arc<dyn DocumentService> =
        Arc::new(GoogleWorkspaceService::new(&config, store)?);
    let registry = Arc::new(ToolRegistry::new(service));
    info!(account = %config.account, "Serving MCP on stdio");

    // Tool calls run on spawned tasks; a single writer task owns stdout so
    // concurrent responses never interleave within a line.
    let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = rx.recv().await {
            let line = match serde_json::to_string(&response) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize response");
                    continue;
                }
            };
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<(), std::io::Error>(())
    });

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(req) => req,
            Err(e) => {
                let _ = tx.send(error(
                    Value::Null,
                    -32700,
                    format!("parse error: {}", e),
                    None,
                ));
                continue;
            }
        };

        // Notifications are never answered, with or without an id.
        if is_notification(&request.method) {
            continue;
        }

        let Some(id) = request.id.clone() else {
            continue;
        };

        match request.method.as_str() {
            "initialize" => {
                let response = match serde_json::from_value::<InitializeRequest>(request.params) {
                    // Accept any client protocol version and respond with ours;
                    // the client adapts.
                    Ok(init) => {
                        let result = initialize::handle_initialize(init);
                        success(id, serde_json::to_value(result)?)
                    }
                    Err(e) => error(id, -32602, format!("invalid initialize params: {}", e), None),
                };
                let _ = tx.send(response);
            }
            "tools/list" => {
                let result = registry.list_response();
                let _ = tx.send(success(id, serde_json::to_value(result)?));
            }
            "tools/call" => match serde_json::from_value::<ToolsCallRequest>(request.params) {
                Ok(call) => {
                    let registry = Arc::clone(&registry);
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let response = match registry.call_tool(&call.name, call.arguments).await {
                            Ok(result) => match serde_json::to_value(&result) {
                                Ok(value) => success(id, value),
                                Err(e) => error(
                                    id,
                                    -32000,
                                    format!("failed to serialize tool result: {}", e),
                                    None,
                                ),
                            },
                            Err(ToolCallError::UnknownTool(name)) => {
                                error(id, -32601, format!("unknown tool: {}", name), None)
                            }
                        };
                        let _ = tx.send(response);
                    });
                }
                Err(e) => {
                    let _ = tx.send(error(
                        id,
                        -32602,
                        format!("invalid tools/call params: {}", e),
                        None,
                    ));
                }
            },
            other => {
                let _ = tx.send(error(id, -32601, format!("method not found: {}", other), None));
            }
        }
    }

    drop(tx);
    writer.await??;
    Ok(())
}

async fn login(config: Config, account: Option<String>) -> anyhow::Result<()> {
    if config.client_id.is_empty() || config.client_secret.is_empty() {
        anyhow::bail!(
            "client_id and client_secret must be set in the config file ({})",
            Config::default_path()?.display()
        );
    }

    let account = account.unwrap_or_else(|| config.account.clone());
    let (provider, store) = build_auth(&config)?;

    let credential = run_consent_flow(&provider, &config.scopes, &account).await?;
    store.store_credential(credential).await?;
    info!(account = %account, "Login complete, tokens stored");
    Ok(())
}

async fn logout(config: Config, account: Option<String>) -> anyhow::Result<()> {
    let account = account.unwrap_or_else(|| config.account.clone());
    let (provider, store) = build_auth(&config)?;

    match store.peek_credential(&account).await? {
        Some(credential) => {
            // Revocation kills the whole grant; a failure still leaves us
            // free to drop the local copy.
            if let Err(e) = provider.revoke(&credential.refresh_token).await {
                warn!(error = %e, "Token revocation failed, deleting local copy anyway");
            }
            store.delete_credential(&account).await?;
            info!(account = %account, "Logged out");
        }
        None => {
            info!(account = %account, "No stored credential for account");
        }
    }
    Ok(())
}
