//! Encrypted file storage backend
//!
//! Persists entries as a JSON file in the platform data directory, each
//! entry individually encrypted with AES-256-GCM under the master key.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::StorageBackend;
use crate::crypto::{decrypt, encrypt, EncryptedData, MasterKey};
use crate::error::{Result, VaultError};

/// Known plaintext sealed into the verification sidecar
const VERIFICATION_PLAINTEXT: &str = "credvault-verification";

/// Encrypted file storage backend
pub struct EncryptedFileStore {
    /// Directory for storage files
    data_dir: PathBuf,
    /// In-memory cache of the encrypted entries
    cache: Arc<RwLock<EntryCache>>,
    /// Master key for entry encryption (present while unlocked)
    master_key: Arc<RwLock<Option<MasterKey>>>,
}

#[derive(Debug, Default)]
struct EntryCache {
    /// Map of key -> serialized ciphertext
    entries: HashMap<String, String>,
    /// Whether the cache diverged from disk since the last save
    dirty: bool,
}

/// On-disk file format
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    saved_at: DateTime<Utc>,
    entries: HashMap<String, String>,
}

impl EncryptedFileStore {
    /// Create a store rooted in the platform data directory
    pub fn new() -> Result<Self> {
        let data_dir = Self::default_data_dir()?;
        Self::with_dir(data_dir)
    }

    /// Create a store rooted in a specific directory (used by tests)
    pub fn with_dir(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)?;

        debug!("Encrypted file store initialized at: {:?}", data_dir);

        Ok(Self {
            data_dir,
            cache: Arc::new(RwLock::new(EntryCache::default())),
            master_key: Arc::new(RwLock::new(None)),
        })
    }

    fn default_data_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "credvault", "credvault")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| VaultError::Storage("Could not determine data directory".to_string()))
    }

    /// Install or clear the master key used for entry encryption
    pub async fn set_master_key(&self, key: Option<MasterKey>) {
        *self.master_key.write().await = key;
    }

    /// Whether a master key is currently installed
    pub async fn has_master_key(&self) -> bool {
        self.master_key.read().await.is_some()
    }

    fn store_file_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    fn salt_file_path(&self) -> PathBuf {
        self.data_dir.join("salt")
    }

    fn verification_file_path(&self) -> PathBuf {
        self.data_dir.join("verify")
    }

    /// Load persisted entries from disk into the cache
    pub async fn load(&self) -> Result<()> {
        let path = self.store_file_path();

        if !path.exists() {
            debug!("No existing store file found");
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let file: StoreFile = serde_json::from_str(&contents)?;

        let mut cache = self.cache.write().await;
        cache.entries = file.entries;
        cache.dirty = false;

        debug!("Loaded {} entries from store", cache.entries.len());
        Ok(())
    }

    /// Save the cache to disk if it changed
    pub async fn save(&self) -> Result<()> {
        let cache = self.cache.read().await;

        if !cache.dirty {
            return Ok(());
        }

        let file = StoreFile {
            version: 1,
            saved_at: Utc::now(),
            entries: cache.entries.clone(),
        };

        let contents = serde_json::to_string_pretty(&file)?;
        let path = self.store_file_path();

        // Atomic replace via temp file
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!("Saved {} entries to store", cache.entries.len());
        Ok(())
    }

    /// Persist the key-derivation salt
    pub async fn save_salt(&self, salt: &str) -> Result<()> {
        let path = self.salt_file_path();
        tokio::fs::write(&path, salt).await?;
        debug!("Saved salt to {:?}", path);
        Ok(())
    }

    /// Load the key-derivation salt, if one was saved
    pub async fn load_salt(&self) -> Result<Option<String>> {
        let path = self.salt_file_path();

        if !path.exists() {
            return Ok(None);
        }

        let salt = tokio::fs::read_to_string(&path).await?;
        Ok(Some(salt.trim().to_string()))
    }

    /// Seal a known plaintext under the current key so later unlocks can
    /// verify the password without decrypting real entries
    pub async fn save_verification(&self) -> Result<()> {
        let master_key = self.master_key.read().await;
        let key = master_key.as_ref().ok_or(VaultError::Locked)?;

        let sealed = encrypt(VERIFICATION_PLAINTEXT.as_bytes(), key)?.to_string();

        let path = self.verification_file_path();
        tokio::fs::write(&path, &sealed).await?;

        debug!("Saved verification data");
        Ok(())
    }

    /// Check whether the installed master key matches the verification sidecar
    pub async fn verify_key(&self) -> Result<bool> {
        let path = self.verification_file_path();

        if !path.exists() {
            // No sidecar - store was never initialized
            return Ok(false);
        }

        let master_key = self.master_key.read().await;
        let key = master_key.as_ref().ok_or(VaultError::Locked)?;

        let sealed = tokio::fs::read_to_string(&path).await?;

        match EncryptedData::from_string(&sealed).and_then(|data| decrypt(&data, key)) {
            Ok(plaintext) => Ok(plaintext == VERIFICATION_PLAINTEXT.as_bytes()),
            Err(_) => {
                debug!("Master key verification failed");
                Ok(false)
            }
        }
    }

    /// Whether the store was initialized (salt and verification exist)
    pub fn is_initialized(&self) -> bool {
        self.salt_file_path().exists() && self.verification_file_path().exists()
    }

    /// The directory holding the store files
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }
}

#[async_trait]
impl StorageBackend for EncryptedFileStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let master_key_guard = self.master_key.read().await;
        let master_key = master_key_guard.as_ref().ok_or(VaultError::Locked)?;

        let sealed = encrypt(value, master_key)?.to_string();

        let mut cache = self.cache.write().await;
        cache.entries.insert(key.to_string(), sealed);
        cache.dirty = true;

        // Release locks before touching disk
        drop(master_key_guard);
        drop(cache);

        self.save().await?;

        debug!("Stored entry: {}", key);
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let master_key_guard = self.master_key.read().await;
        let master_key = master_key_guard.as_ref().ok_or(VaultError::Locked)?;

        let cache = self.cache.read().await;

        match cache.entries.get(key) {
            Some(sealed) => {
                let data = EncryptedData::from_string(sealed)?;
                let plaintext = decrypt(&data, master_key)?;
                debug!("Fetched entry: {}", key);
                Ok(Some(plaintext))
            }
            None => {
                debug!("Entry not found: {}", key);
                Ok(None)
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut cache = self.cache.write().await;

        if cache.entries.remove(key).is_some() {
            cache.dirty = true;
            drop(cache);
            self.save().await?;
            debug!("Removed entry: {}", key);
        }

        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let cache = self.cache.read().await;
        Ok(cache.entries.contains_key(key))
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let cache = self.cache.read().await;

        Ok(cache
            .entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        let mut cache = self.cache.write().await;
        cache.entries.clear();
        cache.dirty = true;
        drop(cache);

        self.save().await?;
        debug!("Cleared all entries");
        Ok(())
    }

    fn is_hardware_backed(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "Encrypted File Store"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_key() -> MasterKey {
        MasterKey::new([5u8; 32])
    }

    async fn test_store() -> (EncryptedFileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
        store.set_master_key(Some(test_key())).await;
        (store, temp_dir)
    }

    #[tokio::test]
    async fn put_and_fetch() {
        let (store, _dir) = test_store().await;

        assert!(!store.contains("k").await.unwrap());

        store.put("k", b"v").await.unwrap();

        assert!(store.contains("k").await.unwrap());
        assert_eq!(store.fetch("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn fetch_missing_is_none() {
        let (store, _dir) = test_store().await;

        assert_eq!(store.fetch("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_deletes_entry() {
        let (store, _dir) = test_store().await;

        store.put("k", b"v").await.unwrap();
        store.remove("k").await.unwrap();

        assert_eq!(store.fetch("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn locked_store_rejects_access() {
        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();

        assert!(!store.has_master_key().await);
        assert!(matches!(
            store.put("k", b"v").await,
            Err(VaultError::Locked)
        ));
        assert!(matches!(store.fetch("k").await, Err(VaultError::Locked)));
    }

    #[tokio::test]
    async fn keys_filter_by_prefix() {
        let (store, _dir) = test_store().await;

        store.put("credential:a", b"1").await.unwrap();
        store.put("credential:b", b"2").await.unwrap();
        store.put("other:c", b"3").await.unwrap();

        let keys = store.keys("credential:").await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"credential:a".to_string()));
        assert!(keys.contains(&"credential:b".to_string()));
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let (store, _dir) = test_store().await;

        store.put("k1", b"v1").await.unwrap();
        store.put("k2", b"v2").await.unwrap();
        store.clear().await.unwrap();

        assert!(store.keys("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = EncryptedFileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
            store.set_master_key(Some(test_key())).await;
            store.put("persistent", b"value").await.unwrap();
        }

        {
            let store = EncryptedFileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
            store.set_master_key(Some(test_key())).await;
            store.load().await.unwrap();

            assert_eq!(
                store.fetch("persistent").await.unwrap(),
                Some(b"value".to_vec())
            );
        }
    }

    #[tokio::test]
    async fn entries_are_encrypted_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
        store.set_master_key(Some(test_key())).await;

        store.put("k", b"super-secret-value").await.unwrap();

        let raw = std::fs::read_to_string(temp_dir.path().join("store.json")).unwrap();
        assert!(!raw.contains("super-secret-value"));
    }

    #[tokio::test]
    async fn verification_detects_wrong_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();

        store.set_master_key(Some(test_key())).await;
        store.save_verification().await.unwrap();
        assert!(store.verify_key().await.unwrap());

        store.set_master_key(Some(MasterKey::new([6u8; 32]))).await;
        assert!(!store.verify_key().await.unwrap());
    }

    #[tokio::test]
    async fn salt_roundtrips() {
        let (store, _dir) = test_store().await;

        assert_eq!(store.load_salt().await.unwrap(), None);

        store.save_salt("some-salt").await.unwrap();
        assert_eq!(
            store.load_salt().await.unwrap(),
            Some("some-salt".to_string())
        );
    }
}
