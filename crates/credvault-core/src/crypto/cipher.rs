//! AES-256-GCM authenticated encryption
//!
//! Ciphertext format: `{iv_hex}:{auth_tag_hex}:{ciphertext_hex}`
//! - IV: 12 bytes (96 bits) - standard for GCM
//! - Auth tag: 16 bytes (128 bits)
//! - Ciphertext: variable length

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use super::MasterKey;
use crate::error::{Result, VaultError};

/// Encrypted payload with IV and auth tag
#[derive(Debug, Clone)]
pub struct EncryptedData {
    /// Initialization vector (12 bytes for GCM)
    pub iv: [u8; 12],
    /// Authentication tag (16 bytes)
    pub auth_tag: [u8; 16],
    /// Encrypted ciphertext
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Display for EncryptedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            hex::encode(self.iv),
            hex::encode(self.auth_tag),
            hex::encode(&self.ciphertext)
        )
    }
}

impl EncryptedData {
    /// Parse from the format `{iv_hex}:{auth_tag_hex}:{ciphertext_hex}`
    pub fn from_string(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(VaultError::Decryption(
                "Invalid ciphertext format: expected iv:tag:ciphertext".to_string(),
            ));
        }

        let iv_bytes = hex::decode(parts[0])
            .map_err(|e| VaultError::Decryption(format!("Invalid IV hex: {}", e)))?;
        let auth_tag_bytes = hex::decode(parts[1])
            .map_err(|e| VaultError::Decryption(format!("Invalid auth tag hex: {}", e)))?;
        let ciphertext = hex::decode(parts[2])
            .map_err(|e| VaultError::Decryption(format!("Invalid ciphertext hex: {}", e)))?;

        if iv_bytes.len() != 12 {
            return Err(VaultError::Decryption(format!(
                "Invalid IV length: expected 12, got {}",
                iv_bytes.len()
            )));
        }
        if auth_tag_bytes.len() != 16 {
            return Err(VaultError::Decryption(format!(
                "Invalid auth tag length: expected 16, got {}",
                auth_tag_bytes.len()
            )));
        }

        let mut iv = [0u8; 12];
        iv.copy_from_slice(&iv_bytes);

        let mut auth_tag = [0u8; 16];
        auth_tag.copy_from_slice(&auth_tag_bytes);

        Ok(Self {
            iv,
            auth_tag,
            ciphertext,
        })
    }
}

/// Encrypt plaintext bytes under the given key.
///
/// A fresh random IV is drawn for every call, so encrypting the same
/// plaintext twice yields different ciphertexts.
pub fn encrypt(plaintext: &[u8], key: &MasterKey) -> Result<EncryptedData> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let mut iv = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut iv);
    let nonce = Nonce::from_slice(&iv);

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext_with_tag = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    if ciphertext_with_tag.len() < 16 {
        return Err(VaultError::Encryption("Ciphertext too short".to_string()));
    }

    let tag_start = ciphertext_with_tag.len() - 16;
    let ciphertext = ciphertext_with_tag[..tag_start].to_vec();
    let mut auth_tag = [0u8; 16];
    auth_tag.copy_from_slice(&ciphertext_with_tag[tag_start..]);

    Ok(EncryptedData {
        iv,
        auth_tag,
        ciphertext,
    })
}

/// Decrypt an encrypted payload under the given key.
///
/// Fails if the key is wrong or the payload was tampered with.
pub fn decrypt(encrypted: &EncryptedData, key: &MasterKey) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Decryption(e.to_string()))?;

    let nonce = Nonce::from_slice(&encrypted.iv);

    // Reconstruct ciphertext with the tag appended, as aes-gcm expects
    let mut ciphertext_with_tag = encrypted.ciphertext.clone();
    ciphertext_with_tag.extend_from_slice(&encrypted.auth_tag);

    cipher
        .decrypt(nonce, ciphertext_with_tag.as_slice())
        .map_err(|e| VaultError::Decryption(e.to_string()))
}
