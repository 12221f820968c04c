//! Interactive consent flow
//!
//! Loopback-redirect OAuth: bind an ephemeral local port, open the
//! authorize URL in the user's browser, wait for the redirect carrying
//! the authorization code, validate the CSRF state, and exchange the
//! code for tokens. Driven by the `login` subcommand only — the server
//! never opens a browser mid-tool-call.

use std::collections::HashMap;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

use super::provider::{generate_code_challenge, generate_code_verifier, generate_state, GoogleProvider};
use super::Credential;
use crate::error::{Error, Result};

/// How long to wait for the user to complete consent in the browser.
const CONSENT_TIMEOUT_SECS: u64 = 120;

/// Run the full consent flow and return a credential ready to store.
pub async fn run_consent_flow(
    provider: &GoogleProvider,
    scopes: &[String],
    account: &str,
) -> Result<Credential> {
    let code_verifier = generate_code_verifier();
    let code_challenge = generate_code_challenge(&code_verifier);
    let state = generate_state();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| Error::Auth(format!("failed to bind loopback listener: {}", e)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| Error::Auth(format!("failed to get local address: {}", e)))?;
    let redirect_uri = format!("http://127.0.0.1:{}", local_addr.port());

    let auth_url = provider.authorize_url(scopes, &state, &code_challenge, &redirect_uri);
    info!("Opening browser for OAuth authorization");

    if let Err(e) = open::that(&auth_url) {
        warn!("Failed to open browser automatically: {}", e);
        return Err(Error::Auth(format!(
            "could not open browser; visit this URL manually: {}",
            auth_url
        )));
    }

    let code = timeout(
        Duration::from_secs(CONSENT_TIMEOUT_SECS),
        wait_for_callback(&listener, &state),
    )
    .await
    .map_err(|_| {
        Error::Auth(format!(
            "consent flow timed out after {} seconds",
            CONSENT_TIMEOUT_SECS
        ))
    })??;

    let tokens = provider
        .exchange_code(&code, &code_verifier, &redirect_uri)
        .await?;

    Ok(Credential {
        account: account.to_string(),
        token_type: tokens.token_type,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token.unwrap_or_default(),
        expiry: tokens.expiry,
        scopes: tokens.scopes,
        last_refreshed: String::new(),
    })
}

/// Accept loopback connections until the OAuth redirect arrives, then
/// return the authorization code.
async fn wait_for_callback(listener: &TcpListener, expected_state: &str) -> Result<String> {
    loop {
        let (mut socket, _) = listener
            .accept()
            .await
            .map_err(|e| Error::Auth(format!("callback listener failed: {}", e)))?;

        let mut reader = BufReader::new(&mut socket);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .await
            .map_err(|e| Error::Auth(format!("failed to read callback request: {}", e)))?;

        // "GET /?code=...&state=... HTTP/1.1"
        let Some(path) = request_line.split_whitespace().nth(1) else {
            continue;
        };
        let query = path.find('?').map(|i| &path[i + 1..]).unwrap_or("");
        let params = parse_query_params(query);

        if let (Some(code), Some(received_state)) = (params.get("code"), params.get("state")) {
            if received_state != expected_state {
                respond(&mut socket, "400 Bad Request", "State mismatch. Please retry.").await;
                return Err(Error::Auth(
                    "OAuth state mismatch; possible CSRF, aborting".to_string(),
                ));
            }
            respond(
                &mut socket,
                "200 OK",
                "Authentication successful. You can close this tab.",
            )
            .await;
            return Ok(code.clone());
        }

        if let Some(err) = params.get("error") {
            let desc = params
                .get("error_description")
                .map(String::as_str)
                .unwrap_or("no description");
            respond(&mut socket, "400 Bad Request", "Authorization was denied.").await;
            return Err(Error::Auth(format!("{}: {}", err, desc)));
        }

        // Not the redirect (favicon etc.) — keep listening.
        respond(&mut socket, "404 Not Found", "").await;
    }
}

fn parse_query_params(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|part| {
            let mut split = part.splitn(2, '=');
            match (split.next(), split.next()) {
                (Some(key), Some(value)) => {
                    let decoded = urlencoding::decode(value).ok()?;
                    Some((key.to_string(), decoded.into_owned()))
                }
                _ => None,
            }
        })
        .collect()
}

/// Minimal HTML response to the browser. Errors here are not actionable.
async fn respond(socket: &mut TcpStream, status: &str, message: &str) {
    let body = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>gdocs-mcp</title></head><body><p>{}</p></body></html>",
        message
    );
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.flush().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_params() {
        let params = parse_query_params("code=4%2F0AX&state=abc123&scope=drive");
        assert_eq!(params.get("code").unwrap(), "4/0AX");
        assert_eq!(params.get("state").unwrap(), "abc123");
        assert_eq!(params.get("scope").unwrap(), "drive");
    }

    #[test]
    fn test_parse_query_params_empty() {
        assert!(parse_query_params("").is_empty());
    }

    #[tokio::test]
    async fn test_callback_rejects_state_mismatch() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut socket = TcpStream::connect(addr).await.unwrap();
            socket
                .write_all(b"GET /?code=abc&state=wrong HTTP/1.1\r\n\r\n")
                .await
                .unwrap();
            let mut buf = Vec::new();
            use tokio::io::AsyncReadExt;
            let _ = socket.read_to_end(&mut buf).await;
        });

        let result = wait_for_callback(&listener, "expected").await;
        assert!(matches!(result, Err(Error::Auth(_))));
        client.await.unwrap();
    }

    #[tokio::test]
    async fn test_callback_extracts_code() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut socket = TcpStream::connect(addr).await.unwrap();
            socket
                .write_all(b"GET /?code=auth-code-42&state=s1 HTTP/1.1\r\n\r\n")
                .await
                .unwrap();
            let mut buf = Vec::new();
            use tokio::io::AsyncReadExt;
            let _ = socket.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).to_string()
        });

        let code = wait_for_callback(&listener, "s1").await.unwrap();
        assert_eq!(code, "auth-code-42");
        let response = client.await.unwrap();
        assert!(response.contains("200 OK"));
    }
}
