//! OS keychain storage backend
//!
//! Uses the system keychain where one is available:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use super::StorageBackend;
use crate::error::{Result, VaultError};

/// Service name used for keychain entries
const SERVICE_NAME: &str = "credvault";

/// OS keychain storage backend
pub struct KeychainStore {
    /// Prefix applied to every key, for namespacing
    prefix: String,
    /// Whether the keychain responded to the availability probe
    available: bool,
}

impl KeychainStore {
    /// Create a keychain store with an optional key prefix
    pub fn new(prefix: Option<&str>) -> Self {
        let prefix = prefix.map(|p| format!("{}-", p)).unwrap_or_default();

        let available = Self::probe_availability();

        if available {
            debug!("Keychain storage is available");
        } else {
            warn!("Keychain storage is not available - falling back to file store");
        }

        Self { prefix, available }
    }

    /// Probe the keychain with a throwaway entry
    fn probe_availability() -> bool {
        match Entry::new(SERVICE_NAME, "__probe__") {
            Ok(entry) => {
                if entry.set_password("probe").is_ok() {
                    let _ = entry.delete_password();
                    true
                } else {
                    false
                }
            }
            Err(_) => false,
        }
    }

    fn entry_for(&self, key: &str) -> Result<Entry> {
        let full_key = format!("{}{}", self.prefix, key);
        Entry::new(SERVICE_NAME, &full_key).map_err(|e| VaultError::Keychain(e.to_string()))
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(VaultError::Keychain("Keychain not available".to_string()))
        }
    }

    /// Whether the keychain answered the availability probe
    pub fn is_available(&self) -> bool {
        self.available
    }
}

#[async_trait]
impl StorageBackend for KeychainStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.ensure_available()?;

        let entry = self.entry_for(key)?;

        // Keychains store strings, so values go in base64-encoded
        entry
            .set_password(&base64_encode(value))
            .map_err(|e| VaultError::Keychain(e.to_string()))?;

        debug!("Stored entry in keychain: {}", key);
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.ensure_available()?;

        let entry = self.entry_for(key)?;

        match entry.get_password() {
            Ok(encoded) => {
                let decoded = base64_decode(&encoded)?;
                debug!("Fetched entry from keychain: {}", key);
                Ok(Some(decoded))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("Entry not found in keychain: {}", key);
                Ok(None)
            }
            Err(e) => Err(VaultError::Keychain(e.to_string())),
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.ensure_available()?;

        let entry = self.entry_for(key)?;

        match entry.delete_password() {
            Ok(()) => {
                debug!("Removed entry from keychain: {}", key);
                Ok(())
            }
            // Already absent
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(VaultError::Keychain(e.to_string())),
        }
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        self.ensure_available()?;

        let entry = self.entry_for(key)?;

        match entry.get_password() {
            Ok(_) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(VaultError::Keychain(e.to_string())),
        }
    }

    async fn keys(&self, _prefix: &str) -> Result<Vec<String>> {
        // Keychain APIs cannot enumerate entries without platform-specific code
        Err(VaultError::Keychain(
            "Listing keys is not supported by keychain storage".to_string(),
        ))
    }

    async fn clear(&self) -> Result<()> {
        // Clearing needs enumeration, which the platform APIs don't offer
        Err(VaultError::Keychain(
            "Clearing all keys is not supported by keychain storage".to_string(),
        ))
    }

    fn is_hardware_backed(&self) -> bool {
        // OS keychains count as hardware-backed: DPAPI, Secure Enclave, etc.
        self.available
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn base64_decode(encoded: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| VaultError::Storage(format!("Base64 decode error: {}", e)))
}
