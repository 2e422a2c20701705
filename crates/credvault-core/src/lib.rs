//! # credvault-core
//!
//! Credential-management core for an automation server:
//! - Username/password credential records with a post-load compatibility fixup
//! - AES-256-GCM secret protection with Argon2id key derivation
//! - A registry of credential kinds with display metadata
//! - Encrypted persistence with file and OS keychain backends

pub mod credential;
pub mod crypto;
pub mod error;
pub mod kind;
pub mod service;
pub mod storage;
mod store;

pub use credential::{CredentialScope, UsernamePasswordCredential};
pub use crypto::{
    derive_key, generate_salt, MasterKey, SecretHandle, SecretProtector, SecretString,
};
pub use error::{Result, VaultError};
pub use kind::{CredentialForm, CredentialKind, KindDescriptor, KindRegistry, UsernamePasswordKind};
pub use service::{CredentialService, ServiceState};
pub use storage::{EncryptedFileStore, KeychainStore, StorageBackend};
pub use store::CredentialStore;
