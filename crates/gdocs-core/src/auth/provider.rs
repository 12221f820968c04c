//! Google OAuth2 provider
//!
//! PKCE Authorization Code flow against Google's endpoints: authorize URL
//! construction, code exchange, token refresh, and revocation. Client
//! credentials come from the config (a "Desktop app" OAuth client).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::{Credential, OAuthTokens, TokenRefresher};
use crate::error::{Error, Result};

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const REVOKE_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";

pub struct GoogleProvider {
    pub client_id: String,
    client_secret: String,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(client_id: String, client_secret: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client_id,
            client_secret,
            http,
        })
    }

    pub fn authorize_url(
        &self,
        scopes: &[String],
        state: &str,
        code_challenge: &str,
        redirect_uri: &str,
    ) -> String {
        let scope_str = scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
            AUTH_ENDPOINT,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope_str),
            urlencoding::encode(state),
            urlencoding::encode(code_challenge),
        )
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<OAuthTokens> {
        info!("Exchanging authorization code for tokens");

        let mut params = HashMap::new();
        params.insert("client_id", self.client_id.as_str());
        params.insert("client_secret", self.client_secret.as_str());
        params.insert("code", code);
        params.insert("code_verifier", code_verifier);
        params.insert("grant_type", "authorization_code");
        params.insert("redirect_uri", redirect_uri);

        let body = self.post_form(TOKEN_ENDPOINT, &params).await?;
        parse_token_response(&body)
    }

    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        info!("Refreshing access token");

        let mut params = HashMap::new();
        params.insert("client_id", self.client_id.as_str());
        params.insert("client_secret", self.client_secret.as_str());
        params.insert("refresh_token", refresh_token);
        params.insert("grant_type", "refresh_token");

        let body = self.post_form(TOKEN_ENDPOINT, &params).await?;
        parse_token_response(&body)
    }

    /// Best-effort revocation at Google.
    pub async fn revoke(&self, token: &str) -> Result<()> {
        info!("Revoking token at Google");

        let mut params = HashMap::new();
        params.insert("token", token);

        let body = self.post_form(REVOKE_ENDPOINT, &params).await?;
        // Google returns 200 with an empty body (or {}) on success.
        if body.contains("error") {
            let parsed: serde_json::Value =
                serde_json::from_str(&body).unwrap_or_else(|_| serde_json::json!({}));
            let message = parsed
                .get("error_description")
                .or_else(|| parsed.get("error"))
                .and_then(|v| v.as_str())
                .unwrap_or("revocation failed");
            return Err(Error::Auth(message.to_string()));
        }
        Ok(())
    }

    /// POST a form-encoded request. Secrets travel in the request body,
    /// never in URLs or process arguments.
    async fn post_form(&self, url: &str, params: &HashMap<&str, &str>) -> Result<String> {
        let response = self
            .http
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout("token endpoint did not respond".to_string())
                } else {
                    Error::Auth(format!("token endpoint request failed: {}", e))
                }
            })?;

        // Error bodies carry the OAuth error code; pass them to the parser.
        response
            .text()
            .await
            .map_err(|e| Error::Auth(format!("failed to read token response: {}", e)))
    }
}

#[async_trait]
impl TokenRefresher for GoogleProvider {
    async fn refresh(&self, credential: &Credential) -> Result<OAuthTokens> {
        if credential.refresh_token.is_empty() {
            return Err(Error::AuthExpired(
                "no refresh token stored; re-run `gdocs-mcp login`".to_string(),
            ));
        }
        self.refresh_access_token(&credential.refresh_token).await
    }
}

/// Parse a Google OAuth2 token response body.
///
/// `invalid_grant` means the refresh token itself was rejected (revoked or
/// expired) and maps to `AuthExpired`; other OAuth errors map to `Auth`.
fn parse_token_response(body: &str) -> Result<OAuthTokens> {
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::Auth(format!("invalid token response JSON: {}", e)))?;

    if let Some(err) = parsed.get("error").and_then(|v| v.as_str()) {
        let desc = parsed
            .get("error_description")
            .and_then(|v| v.as_str())
            .unwrap_or("no description");
        let message = format!("{}: {}", err, desc);
        return if err == "invalid_grant" {
            Err(Error::AuthExpired(message))
        } else {
            Err(Error::Auth(message))
        };
    }

    let access_token = parsed
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Auth("missing access_token in response".to_string()))?
        .to_string();

    let refresh_token = parsed
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .map(String::from);

    let token_type = parsed
        .get("token_type")
        .and_then(|v| v.as_str())
        .unwrap_or("Bearer")
        .to_string();

    let expires_in = parsed
        .get("expires_in")
        .and_then(|v| v.as_u64())
        .unwrap_or(3600);
    let expiry =
        (chrono::Utc::now() + chrono::Duration::seconds(expires_in as i64)).to_rfc3339();

    let scopes = parsed
        .get("scope")
        .and_then(|v| v.as_str())
        .map(|s| s.split(' ').map(String::from).collect())
        .unwrap_or_default();

    Ok(OAuthTokens {
        access_token,
        refresh_token,
        token_type,
        expiry,
        scopes,
    })
}

// ── PKCE utilities ──────────────────────────────────────────────────────────

/// Generate a PKCE code verifier (43-128 unreserved URI characters).
pub fn generate_code_verifier() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64_url_encode(&bytes)
}

/// Derive the S256 code challenge from a verifier.
pub fn generate_code_challenge(verifier: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(verifier.as_bytes());
    base64_url_encode(&hash)
}

/// Random state string for CSRF protection.
pub fn generate_state() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::rngs::OsRng.gen();
    hex::encode(bytes)
}

/// Base64url without padding, per RFC 4648 §5.
fn base64_url_encode(data: &[u8]) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    URL_SAFE_NO_PAD.encode(data)
}
