//! Secret protection for credential material
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption
//! - Argon2id key derivation from the master password
//! - Zeroize-on-drop handling for keys and revealed plaintext
//! - The [`SecretProtector`] wrap/reveal collaborator used by credential records

mod cipher;
mod derive;
mod protector;

pub use cipher::{decrypt, encrypt, EncryptedData};
pub use derive::{derive_key, generate_salt, KeyDerivationParams};
pub use protector::{MasterKey, SecretHandle, SecretProtector, SecretString};
