//! Error types for credvault-core

use thiserror::Error;

/// Result type alias for credential operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Credential subsystem error types
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Store is locked - unlock with the master password first")]
    Locked,

    #[error("Store is not initialized - create it first")]
    NotInitialized,

    #[error("Invalid master password")]
    InvalidPassword,

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Credential not found: {0}")]
    CredentialNotFound(String),

    #[error("Unknown credential kind: {0}")]
    UnknownKind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
