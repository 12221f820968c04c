//! Document service
//!
//! The facade the tool dispatcher talks to. `GoogleWorkspaceService`
//! wires credential store → authenticated client → converter → cache;
//! the trait seam lets dispatcher tests substitute a fake.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::auth::CredentialStore;
use crate::cache::ContentCache;
use crate::config::Config;
use crate::convert::{self, Format};
use crate::error::{Error, Result};
use crate::google::client::{GoogleClient, Timeouts};
use crate::google::drive::{DocKind, DocumentMetadata, DriveApi};
use crate::google::{DocsApi, SheetsApi, SlidesApi};

/// A converted document plus the metadata snapshot it was read with.
#[derive(Debug, Clone)]
pub struct DocumentContent {
    pub metadata: DocumentMetadata,
    pub format: Format,
    pub text: String,
}

#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<DocumentMetadata>>;
    async fn list(
        &self,
        folder_id: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<DocumentMetadata>>;
    async fn read(&self, document_id: &str, format: Format) -> Result<DocumentContent>;
}

pub struct GoogleWorkspaceService {
    store: Arc<CredentialStore>,
    account: String,
    /// One connection pool for the service's lifetime.
    http: reqwest::Client,
    limiter: Arc<Semaphore>,
    timeouts: Timeouts,
    cache: ContentCache,
}

impl GoogleWorkspaceService {
    pub fn new(config: &Config, store: Arc<CredentialStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            store,
            account: config.account.clone(),
            http,
            limiter: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            timeouts: Timeouts {
                metadata: Duration::from_secs(config.metadata_timeout_secs),
                content: Duration::from_secs(config.content_timeout_secs),
            },
            cache: ContentCache::new(Duration::from_secs(config.cache_ttl_secs)),
        })
    }

    /// Build a client around a credential valid at this moment. The pool
    /// is shared; only the bearer token is per-call.
    async fn client(&self) -> Result<GoogleClient> {
        let credential = self.store.get_valid_credential(&self.account).await?;
        Ok(GoogleClient::new(
            self.http.clone(),
            credential.access_token.clone(),
            Arc::clone(&self.limiter),
            self.timeouts,
        ))
    }

    async fn fetch_native(&self, document_id: &str, kind: DocKind) -> Result<serde_json::Value> {
        match kind {
            DocKind::Document => {
                DocsApi::new(self.client().await?)
                    .get_document(document_id)
                    .await
            }
            DocKind::Spreadsheet => {
                SheetsApi::new(self.client().await?)
                    .get_spreadsheet(document_id)
                    .await
            }
            DocKind::Presentation => {
                SlidesApi::new(self.client().await?)
                    .get_presentation(document_id)
                    .await
            }
        }
    }
}

#[async_trait]
impl DocumentService for GoogleWorkspaceService {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<DocumentMetadata>> {
        DriveApi::new(self.client().await?)
            .search(query, max_results)
            .await
    }

    async fn list(
        &self,
        folder_id: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<DocumentMetadata>> {
        DriveApi::new(self.client().await?)
            .list(folder_id, max_results)
            .await
    }

    async fn read(&self, document_id: &str, format: Format) -> Result<DocumentContent> {
        // Metadata is a per-request snapshot, never served from cache.
        let metadata = DriveApi::new(self.client().await?)
            .metadata(document_id)
            .await?;

        let kind = DocKind::from_mime(&metadata.mime_type).ok_or_else(|| {
            Error::UnsupportedFormat(format!(
                "'{}' is not a readable Workspace document type",
                metadata.mime_type
            ))
        })?;

        if let Some(text) = self.cache.get(document_id, format).await {
            return Ok(DocumentContent {
                metadata,
                format,
                text,
            });
        }

        let raw = self.fetch_native(document_id, kind).await?;
        let text = convert::convert(&raw, kind, format)?;
        debug!(document_id, kind = kind.as_str(), "Converted document content");

        self.cache.put(document_id, format, text.clone()).await;
        Ok(DocumentContent {
            metadata,
            format,
            text,
        })
    }
}
