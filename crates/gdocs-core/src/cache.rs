//! Converted-content cache
//!
//! Short-lived cache keyed by `(document_id, format)`. Entries expire
//! after a fixed TTL; lookups drop expired entries and inserts purge
//! whatever has already expired. A zero TTL disables caching entirely.
//! Metadata is never cached — only converted text.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::convert::Format;

struct Entry {
    text: String,
    inserted: Instant,
}

pub struct ContentCache {
    ttl: Duration,
    entries: RwLock<HashMap<(String, Format), Entry>>,
}

impl ContentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, document_id: &str, format: Format) -> Option<String> {
        if self.ttl.is_zero() {
            return None;
        }

        let key = (document_id.to_string(), format);
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if entry.inserted.elapsed() < self.ttl => {
                    debug!(document_id, format = format.as_str(), "Content cache hit");
                    return Some(entry.text.clone());
                }
                Some(_) => {} // expired, fall through to remove
                None => return None,
            }
        }

        self.entries.write().await.remove(&key);
        None
    }

    pub async fn put(&self, document_id: &str, format: Format, text: String) {
        if self.ttl.is_zero() {
            return;
        }

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.inserted.elapsed() < self.ttl);
        entries.insert(
            (document_id.to_string(), format),
            Entry {
                text,
                inserted: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = ContentCache::new(Duration::from_secs(60));
        cache.put("doc1", Format::Markdown, "# Hello".to_string()).await;
        assert_eq!(
            cache.get("doc1", Format::Markdown).await.as_deref(),
            Some("# Hello")
        );
    }

    #[tokio::test]
    async fn test_keyed_by_id_and_format() {
        let cache = ContentCache::new(Duration::from_secs(60));
        cache.put("doc1", Format::Markdown, "# Hello".to_string()).await;
        assert!(cache.get("doc1", Format::Text).await.is_none());
        assert!(cache.get("doc2", Format::Markdown).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ContentCache::new(Duration::from_secs(60));
        cache.put("doc1", Format::Text, "body".to_string()).await;

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("doc1", Format::Text).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_purges_expired_entries() {
        let cache = ContentCache::new(Duration::from_secs(60));
        cache.put("old", Format::Text, "stale".to_string()).await;

        tokio::time::advance(Duration::from_secs(61)).await;
        cache.put("new", Format::Text, "fresh".to_string()).await;

        let entries = cache.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key(&("new".to_string(), Format::Text)));
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_caching() {
        let cache = ContentCache::new(Duration::ZERO);
        cache.put("doc1", Format::Text, "body".to_string()).await;
        assert!(cache.get("doc1", Format::Text).await.is_none());
    }
}
