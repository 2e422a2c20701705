//! The owning store for credential records

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::credential::UsernamePasswordCredential;
use crate::crypto::{SecretProtector, SecretString};
use crate::error::{Result, VaultError};
use crate::kind::{CredentialForm, CredentialKind};
use crate::storage::StorageBackend;

/// Storage key prefix for credential records
const CREDENTIAL_PREFIX: &str = "credential:";

/// CRUD surface over persisted credential records.
///
/// Every record leaving this store has been through
/// [`UsernamePasswordCredential::normalize_after_load`], so the
/// `username_secret` flag is resolved by the time a caller sees it.
pub struct CredentialStore {
    /// Storage backend
    backend: Arc<dyn StorageBackend>,
    /// Secret protector (present while unlocked)
    protector: Arc<RwLock<Option<SecretProtector>>>,
}

impl CredentialStore {
    /// Create a store over the given backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            protector: Arc::new(RwLock::new(None)),
        }
    }

    /// Install or clear the secret protector (set on unlock, cleared on lock)
    pub async fn set_protector(&self, protector: Option<SecretProtector>) {
        *self.protector.write().await = protector;
    }

    /// Build a record through a kind's form binding and persist it
    pub async fn create(
        &self,
        kind: &dyn CredentialKind,
        form: CredentialForm,
    ) -> Result<UsernamePasswordCredential> {
        let credential = {
            let guard = self.protector.read().await;
            let protector = guard.as_ref().ok_or(VaultError::Locked)?;
            kind.construct(form, protector)?
        };

        self.save(&credential).await?;

        info!(
            "Created {} credential: {}",
            kind.symbol(),
            credential.id()
        );
        Ok(credential)
    }

    /// Persist a record under its id
    pub async fn save(&self, credential: &UsernamePasswordCredential) -> Result<()> {
        let data = serde_json::to_vec(credential)?;
        self.backend.put(&storage_key(credential.id()), &data).await?;
        Ok(())
    }

    /// Load a record by id, running the post-load fixup before returning it
    pub async fn get(&self, id: &str) -> Result<Option<UsernamePasswordCredential>> {
        match self.backend.fetch(&storage_key(id)).await? {
            Some(data) => {
                let mut credential: UsernamePasswordCredential = serde_json::from_slice(&data)?;
                credential.normalize_after_load();
                Ok(Some(credential))
            }
            None => Ok(None),
        }
    }

    /// List every stored record, each fixed up before it is returned
    pub async fn list(&self) -> Result<Vec<UsernamePasswordCredential>> {
        let keys = self.backend.keys(CREDENTIAL_PREFIX).await?;
        let mut credentials = Vec::new();

        for key in keys {
            if let Some(data) = self.backend.fetch(&key).await? {
                let mut credential: UsernamePasswordCredential = serde_json::from_slice(&data)?;
                credential.normalize_after_load();
                credentials.push(credential);
            }
        }

        Ok(credentials)
    }

    /// Delete a record. Removing an absent id is not an error.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.backend.remove(&storage_key(id)).await?;
        info!("Deleted credential: {}", id);
        Ok(())
    }

    /// Store-mediated description update
    pub async fn update_description(&self, id: &str, description: &str) -> Result<()> {
        let mut credential = self.require(id).await?;
        credential.set_description(description.to_string());
        self.save(&credential).await?;

        debug!("Updated description for credential: {}", id);
        Ok(())
    }

    /// Persist a form-driven change to the username secrecy flag
    pub async fn set_username_secret(&self, id: &str, username_secret: bool) -> Result<()> {
        let mut credential = self.require(id).await?;
        credential.set_username_secret(username_secret);
        self.save(&credential).await?;

        debug!("Updated username secrecy for credential: {}", id);
        Ok(())
    }

    /// Reveal the password plaintext for a stored record.
    ///
    /// Decryption failures from the protector (tampering, key rotation)
    /// propagate to the caller unmodified.
    pub async fn reveal_password(&self, id: &str) -> Result<SecretString> {
        let credential = self.require(id).await?;

        let guard = self.protector.read().await;
        let protector = guard.as_ref().ok_or(VaultError::Locked)?;
        protector.reveal(credential.password())
    }

    async fn require(&self, id: &str) -> Result<UsernamePasswordCredential> {
        self.get(id)
            .await?
            .ok_or_else(|| VaultError::CredentialNotFound(id.to_string()))
    }
}

fn storage_key(id: &str) -> String {
    format!("{}{}", CREDENTIAL_PREFIX, id)
}
