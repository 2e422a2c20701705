//! Key material, opaque secret handles, and the wrap/reveal collaborator

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::cipher::{decrypt, encrypt, EncryptedData};
use crate::error::{Result, VaultError};

/// Master encryption key - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; 32],
}

impl MasterKey {
    /// Create a new master key from raw bytes
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// Create from a slice (must be exactly 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != 32 {
            return None;
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(slice);
        Some(Self { key })
    }
}

impl Clone for MasterKey {
    fn clone(&self) -> Self {
        Self { key: self.key }
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Opaque reference to a protected value.
///
/// Carries only the serialized ciphertext, so it is safe to persist,
/// compare, and log. The plaintext is recoverable only through
/// [`SecretProtector::reveal`]; there is no string conversion.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretHandle(String);

impl SecretHandle {
    /// The serialized ciphertext, exactly as persisted.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretHandle").field(&"[ciphertext]").finish()
    }
}

/// Revealed plaintext - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: String) -> Self {
        Self { value }
    }

    /// Get the secret value (use carefully)
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Consume and return the inner value
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.value)
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// The wrap/reveal collaborator protecting credential secrets at rest.
///
/// Credential records hold [`SecretHandle`]s produced by [`wrap`]; any
/// consumer needing the plaintext goes back through [`reveal`].
///
/// [`wrap`]: SecretProtector::wrap
/// [`reveal`]: SecretProtector::reveal
#[derive(Clone)]
pub struct SecretProtector {
    key: MasterKey,
}

impl SecretProtector {
    /// Create a protector over the given master key
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }

    /// Encrypt plaintext into an opaque, storable handle
    pub fn wrap(&self, plaintext: &str) -> Result<SecretHandle> {
        let sealed = encrypt(plaintext.as_bytes(), &self.key)?;
        Ok(SecretHandle(sealed.to_string()))
    }

    /// Decrypt a handle back to plaintext.
    ///
    /// Failures (wrong key after rotation, tampered ciphertext) surface as
    /// [`VaultError::Decryption`] and are never caught on this path.
    pub fn reveal(&self, handle: &SecretHandle) -> Result<SecretString> {
        let sealed = EncryptedData::from_string(&handle.0)?;
        let plaintext = decrypt(&sealed, &self.key)?;
        let value = String::from_utf8(plaintext)
            .map_err(|e| VaultError::Decryption(format!("Invalid UTF-8: {}", e)))?;
        Ok(SecretString::new(value))
    }
}

impl std::fmt::Debug for SecretProtector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretProtector")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
