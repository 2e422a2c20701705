//! Master-password key derivation using Argon2id

use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use super::MasterKey;
use crate::error::{Result, VaultError};

/// Parameters for Argon2id key derivation
#[derive(Debug, Clone)]
pub struct KeyDerivationParams {
    /// Memory cost in KiB (default: 65536 = 64MB)
    pub memory_cost: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).to_string()
}

/// Derive a 256-bit master key from a password and salt.
///
/// Pass `None` for the default parameters; tests may supply lighter ones.
pub fn derive_key(
    password: &str,
    salt: &str,
    params: Option<KeyDerivationParams>,
) -> Result<MasterKey> {
    let params = params.unwrap_or_default();

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(32), // 32 bytes = 256-bit key
    )
    .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let salt = SaltString::from_b64(salt)
        .map_err(|e| VaultError::KeyDerivation(format!("Invalid salt: {}", e)))?;

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

    let hash = password_hash
        .hash
        .ok_or_else(|| VaultError::KeyDerivation("No hash output".to_string()))?;

    let hash_bytes = hash.as_bytes();
    if hash_bytes.len() < 32 {
        return Err(VaultError::KeyDerivation(
            "Hash output too short".to_string(),
        ));
    }

    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&hash_bytes[..32]);

    Ok(MasterKey::new(key_bytes))
}
