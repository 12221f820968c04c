//! Credential store
//!
//! Owns OAuth tokens at rest and hands out access tokens that are
//! guaranteed non-expired at return time. Refreshes happen transparently
//! when a token is within the safety margin of its expiry, and are
//! serialized per account: concurrent callers needing the same refresh
//! await one exchange and share its outcome.

pub mod flow;
pub mod provider;
pub mod store;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use self::store::TokenFiles;

/// Refresh when the token expires within this many seconds.
pub const REFRESH_MARGIN_SECS: i64 = 60;

// ── Credential ──────────────────────────────────────────────────────────────

/// Stored credential (decrypted form). Token fields are zeroized on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    #[zeroize(skip)]
    pub account: String,
    #[zeroize(skip)]
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    /// RFC 3339 expiry timestamp.
    #[zeroize(skip)]
    pub expiry: String,
    #[zeroize(skip)]
    pub scopes: Vec<String>,
    #[serde(default)]
    #[zeroize(skip)]
    pub last_refreshed: String,
}

// Debug must never leak token material.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account", &self.account)
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("scopes", &self.scopes)
            .field("last_refreshed", &self.last_refreshed)
            .finish()
    }
}

impl Credential {
    /// Whether the expiry (RFC 3339) is within `margin_secs` of now.
    /// An unparseable expiry counts as expired.
    pub fn is_expiring_within(&self, margin_secs: i64) -> bool {
        match chrono::DateTime::parse_from_rfc3339(&self.expiry) {
            Ok(exp) => {
                let remaining = exp
                    .signed_duration_since(chrono::Utc::now())
                    .num_seconds();
                remaining < margin_secs
            }
            Err(_) => true,
        }
    }
}

/// Result of a token exchange or refresh at the identity provider.
#[derive(Debug, Clone)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expiry: String,
    pub scopes: Vec<String>,
}

/// Seam between the store and the identity provider, so refresh exchanges
/// can be counted and faked in tests.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, credential: &Credential) -> Result<OAuthTokens>;
}

// ── CredentialStore ─────────────────────────────────────────────────────────

pub struct CredentialStore {
    files: TokenFiles,
    refresher: Arc<dyn TokenRefresher>,
    /// Decrypted records, loaded lazily from disk.
    cache: RwLock<HashMap<String, Credential>>,
    /// One refresh in flight per account, never more.
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CredentialStore {
    pub fn new(data_dir: &Path, refresher: Arc<dyn TokenRefresher>) -> Result<Self> {
        let files = TokenFiles::new(data_dir)?;
        Ok(Self {
            files,
            refresher,
            cache: RwLock::new(HashMap::new()),
            refresh_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Return a credential guaranteed non-expired at return time,
    /// refreshing and persisting first when needed.
    pub async fn get_valid_credential(&self, account: &str) -> Result<Credential> {
        let credential = self.load(account).await?.ok_or_else(|| {
            Error::Auth(format!(
                "no stored credential for account '{}'; run `gdocs-mcp login` first",
                account
            ))
        })?;

        if !credential.is_expiring_within(REFRESH_MARGIN_SECS) {
            return Ok(credential);
        }

        let lock = self.account_lock(account).await;
        let _guard = lock.lock().await;

        // Re-check under the lock: a concurrent caller may have finished
        // the refresh while we waited.
        if let Some(current) = self.load(account).await? {
            if !current.is_expiring_within(REFRESH_MARGIN_SECS) {
                return Ok(current);
            }
            return self.refresh_and_persist(current).await;
        }

        Err(Error::Auth(format!(
            "credential for account '{}' disappeared during refresh",
            account
        )))
    }

    /// Look at the stored credential without refreshing (used by logout
    /// to revoke whatever is on disk, expired or not).
    pub async fn peek_credential(&self, account: &str) -> Result<Option<Credential>> {
        self.load(account).await
    }

    /// Store (create or replace) a credential and persist it.
    pub async fn store_credential(&self, credential: Credential) -> Result<()> {
        self.files.save(&credential)?;
        info!(account = %credential.account, "Stored credential");
        let mut cache = self.cache.write().await;
        cache.insert(credential.account.clone(), credential);
        Ok(())
    }

    /// Remove a credential from disk and memory.
    pub async fn delete_credential(&self, account: &str) -> Result<()> {
        self.files.delete(account)?;
        let mut cache = self.cache.write().await;
        cache.remove(account);
        info!(account, "Deleted credential");
        Ok(())
    }

    // ── Internal ────────────────────────────────────────────────────────────

    async fn load(&self, account: &str) -> Result<Option<Credential>> {
        {
            let cache = self.cache.read().await;
            if let Some(credential) = cache.get(account) {
                return Ok(Some(credential.clone()));
            }
        }

        match self.files.load(account)? {
            Some(credential) => {
                let mut cache = self.cache.write().await;
                cache.insert(account.to_string(), credential.clone());
                Ok(Some(credential))
            }
            None => Ok(None),
        }
    }

    async fn account_lock(&self, account: &str) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        locks
            .entry(account.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn refresh_and_persist(&self, mut credential: Credential) -> Result<Credential> {
        info!(account = %credential.account, "Refreshing access token");

        let tokens = self.refresher.refresh(&credential).await.map_err(|e| {
            warn!(account = %credential.account, "Token refresh failed: {}", e);
            e
        })?;

        credential.access_token = tokens.access_token;
        if let Some(refresh_token) = tokens.refresh_token {
            credential.refresh_token = refresh_token;
        }
        credential.expiry = tokens.expiry;
        credential.last_refreshed = chrono::Utc::now().to_rfc3339();

        self.files.save(&credential)?;
        let mut cache = self.cache.write().await;
        cache.insert(credential.account.clone(), credential.clone());

        Ok(credential)
    }
}
