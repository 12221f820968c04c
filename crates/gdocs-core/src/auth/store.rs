//! Token files
//!
//! One JSON file per account under `<data_dir>/tokens/`, with a
//! SHA-256-derived filename so account ids never appear on disk. Files
//! are rewritten atomically: write to a temp sibling, then rename.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::Credential;
use crate::error::{Error, Result};

pub struct TokenFiles {
    tokens_dir: PathBuf,
}

impl TokenFiles {
    pub fn new(data_dir: &Path) -> Result<Self> {
        let tokens_dir = data_dir.join("tokens");
        fs::create_dir_all(&tokens_dir)
            .map_err(|e| Error::Internal(format!("failed to create token dir: {}", e)))?;
        Ok(Self { tokens_dir })
    }

    pub fn load(&self, account: &str) -> Result<Option<Credential>> {
        let path = self.token_path(account);
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&path)
            .map_err(|e| Error::Internal(format!("failed to read token file: {}", e)))?;

        match serde_json::from_str::<Credential>(&data) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                // A corrupt token file is unrecoverable; treat as absent so
                // the caller is told to re-authenticate.
                warn!(account, "Discarding corrupt token file: {}", e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, credential: &Credential) -> Result<()> {
        let path = self.token_path(&credential.account);
        let json = serde_json::to_vec_pretty(credential)
            .map_err(|e| Error::Internal(format!("failed to serialize token: {}", e)))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)
            .map_err(|e| Error::Internal(format!("failed to write token file: {}", e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| Error::Internal(format!("failed to replace token file: {}", e)))?;
        Ok(())
    }

    pub fn delete(&self, account: &str) -> Result<()> {
        let path = self.token_path(account);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| Error::Internal(format!("failed to delete token file: {}", e)))?;
        }
        Ok(())
    }

    /// `tokens/<first 8 hash bytes as hex>.json`
    fn token_path(&self, account: &str) -> PathBuf {
        let hash = Sha256::digest(account.as_bytes());
        let name = hex::encode(&hash[..8]);
        self.tokens_dir.join(format!("{}.json", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(account: &str) -> Credential {
        Credential {
            account: account.to_string(),
            token_type: "Bearer".to_string(),
            access_token: "ya29.test".to_string(),
            refresh_token: "1//0e.test".to_string(),
            expiry: "2026-08-27T12:00:00+00:00".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/drive.readonly".to_string()],
            last_refreshed: String::new(),
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let files = TokenFiles::new(dir.path()).unwrap();

        files.save(&credential("alice@example.com")).unwrap();
        let loaded = files.load("alice@example.com").unwrap().unwrap();
        assert_eq!(loaded.access_token, "ya29.test");
        assert_eq!(loaded.account, "alice@example.com");
    }

    #[test]
    fn test_missing_account_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let files = TokenFiles::new(dir.path()).unwrap();
        assert!(files.load("nobody").unwrap().is_none());
    }

    #[test]
    fn test_account_id_not_in_filename() {
        let dir = tempfile::tempdir().unwrap();
        let files = TokenFiles::new(dir.path()).unwrap();
        files.save(&credential("alice@example.com")).unwrap();

        for entry in fs::read_dir(dir.path().join("tokens")).unwrap() {
            let name = entry.unwrap().file_name().into_string().unwrap();
            assert!(!name.contains("alice"));
            assert!(name.ends_with(".json"));
        }
    }

    #[test]
    fn test_corrupt_file_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let files = TokenFiles::new(dir.path()).unwrap();
        files.save(&credential("alice")).unwrap();

        let path = files.token_path("alice");
        fs::write(&path, b"{ not json").unwrap();
        assert!(files.load("alice").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let files = TokenFiles::new(dir.path()).unwrap();
        files.save(&credential("alice")).unwrap();

        let mut updated = credential("alice");
        updated.access_token = "ya29.updated".to_string();
        files.save(&updated).unwrap();

        let loaded = files.load("alice").unwrap().unwrap();
        assert_eq!(loaded.access_token, "ya29.updated");
        // No stray temp file left behind.
        let entries = fs::read_dir(dir.path().join("tokens")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let files = TokenFiles::new(dir.path()).unwrap();
        files.save(&credential("alice")).unwrap();
        files.delete("alice").unwrap();
        files.delete("alice").unwrap();
        assert!(files.load("alice").unwrap().is_none());
    }
}
