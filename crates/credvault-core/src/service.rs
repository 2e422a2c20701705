//! Subsystem orchestration
//!
//! Wires the storage backend, secret protector, credential store, and kind
//! registry behind an initialize/unlock/lock lifecycle.

use std::sync::Arc;

use tracing::{debug, info};

use crate::credential::UsernamePasswordCredential;
use crate::crypto::{derive_key, generate_salt, SecretProtector};
use crate::error::{Result, VaultError};
use crate::kind::{CredentialForm, KindRegistry};
use crate::storage::EncryptedFileStore;
use crate::store::CredentialStore;

/// Lifecycle state of the credential service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// No master password has been set up yet
    NotInitialized,
    /// Initialized, but key material is not in memory
    Locked,
    /// Key material installed; the store is usable
    Unlocked,
}

/// Top-level handle to the credential subsystem
pub struct CredentialService {
    /// Storage backend
    backend: Arc<EncryptedFileStore>,
    /// Credential store over the backend
    store: CredentialStore,
    /// Registered credential kinds
    kinds: KindRegistry,
    /// Current lifecycle state
    state: ServiceState,
}

impl CredentialService {
    /// Create a service over the platform data directory
    pub fn new() -> Result<Self> {
        let backend = Arc::new(EncryptedFileStore::new()?);
        Ok(Self::with_backend(backend))
    }

    /// Create a service over a specific backend (used by tests)
    pub fn with_backend(backend: Arc<EncryptedFileStore>) -> Self {
        let state = if backend.is_initialized() {
            ServiceState::Locked
        } else {
            ServiceState::NotInitialized
        };

        let store = CredentialStore::new(backend.clone());

        Self {
            backend,
            store,
            kinds: KindRegistry::with_builtin(),
            state,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Whether key material is installed
    pub fn is_unlocked(&self) -> bool {
        self.state == ServiceState::Unlocked
    }

    /// The credential store
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// The kind registry
    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    /// Resolve a kind by symbol and create a credential through its form
    /// binding
    pub async fn create_credential(
        &self,
        symbol: &str,
        form: CredentialForm,
    ) -> Result<UsernamePasswordCredential> {
        let kind = self
            .kinds
            .get(symbol)
            .await
            .ok_or_else(|| VaultError::UnknownKind(symbol.to_string()))?;

        self.store.create(kind.as_ref(), form).await
    }

    /// First-time setup: derive the master key from a password and leave the
    /// service unlocked
    pub async fn initialize(&mut self, password: &str) -> Result<()> {
        if self.state != ServiceState::NotInitialized {
            return Err(VaultError::Storage(
                "Service already initialized".to_string(),
            ));
        }

        info!("Initializing credential service");

        let salt = generate_salt();
        let master_key = derive_key(password, &salt, None)?;

        self.backend.save_salt(&salt).await?;
        self.backend.set_master_key(Some(master_key.clone())).await;
        self.backend.save_verification().await?;

        self.store
            .set_protector(Some(SecretProtector::new(master_key)))
            .await;
        self.state = ServiceState::Unlocked;

        info!("Credential service initialized");
        Ok(())
    }

    /// Unlock with the master password and load persisted state
    pub async fn unlock(&mut self, password: &str) -> Result<()> {
        if self.state == ServiceState::NotInitialized {
            return Err(VaultError::NotInitialized);
        }

        if self.state == ServiceState::Unlocked {
            debug!("Service already unlocked");
            return Ok(());
        }

        let salt = self
            .backend
            .load_salt()
            .await?
            .ok_or(VaultError::NotInitialized)?;

        let master_key = derive_key(password, &salt, None)?;

        self.backend.set_master_key(Some(master_key.clone())).await;

        if !self.backend.verify_key().await? {
            self.backend.set_master_key(None).await;
            return Err(VaultError::InvalidPassword);
        }

        self.backend.load().await?;

        self.store
            .set_protector(Some(SecretProtector::new(master_key)))
            .await;
        self.state = ServiceState::Unlocked;

        info!("Credential service unlocked");
        Ok(())
    }

    /// Drop key material from memory
    pub async fn lock(&mut self) -> Result<()> {
        self.backend.set_master_key(None).await;
        self.store.set_protector(None).await;
        self.state = ServiceState::Locked;

        info!("Credential service locked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::UsernamePasswordKind;
    use tempfile::TempDir;

    async fn test_service() -> (CredentialService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend =
            Arc::new(EncryptedFileStore::with_dir(temp_dir.path().to_path_buf()).unwrap());
        (CredentialService::with_backend(backend), temp_dir)
    }

    fn form(username: &str, password: &str) -> CredentialForm {
        CredentialForm {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn initialize_lock_unlock_cycle() {
        let (mut service, _dir) = test_service().await;

        assert_eq!(service.state(), ServiceState::NotInitialized);

        service.initialize("master-password").await.unwrap();
        assert_eq!(service.state(), ServiceState::Unlocked);

        service.lock().await.unwrap();
        assert_eq!(service.state(), ServiceState::Locked);

        service.unlock("master-password").await.unwrap();
        assert!(service.is_unlocked());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (mut service, _dir) = test_service().await;

        service.initialize("correct-password").await.unwrap();
        service.lock().await.unwrap();

        let result = service.unlock("wrong-password").await;
        assert!(matches!(result, Err(VaultError::InvalidPassword)));
        assert_eq!(service.state(), ServiceState::Locked);
    }

    #[tokio::test]
    async fn unlock_before_initialize_fails() {
        let (mut service, _dir) = test_service().await;

        let result = service.unlock("anything").await;
        assert!(matches!(result, Err(VaultError::NotInitialized)));
    }

    #[tokio::test]
    async fn credentials_survive_lock_cycle() {
        let (mut service, _dir) = test_service().await;

        service.initialize("master-password").await.unwrap();

        let created = service
            .store()
            .create(&UsernamePasswordKind, form("bob", "hunter2"))
            .await
            .unwrap();
        let id = created.id().to_string();

        service.lock().await.unwrap();
        assert!(matches!(
            service.store().get(&id).await,
            Err(VaultError::Locked)
        ));

        service.unlock("master-password").await.unwrap();

        let loaded = service.store().get(&id).await.unwrap().unwrap();
        assert_eq!(loaded.username(), "bob");
        assert_eq!(
            service.store().reveal_password(&id).await.unwrap().expose(),
            "hunter2"
        );
    }

    #[tokio::test]
    async fn create_credential_resolves_symbol() {
        let (mut service, _dir) = test_service().await;
        service.initialize("master-password").await.unwrap();

        let created = service
            .create_credential("username_password", form("bob", "hunter2"))
            .await
            .unwrap();

        assert_eq!(created.username(), "bob");

        let result = service
            .create_credential("certificate", form("bob", "hunter2"))
            .await;
        assert!(matches!(result, Err(VaultError::UnknownKind(_))));
    }

    #[tokio::test]
    async fn builtin_kind_available_through_service() {
        let (service, _dir) = test_service().await;

        let descriptors = service.kinds().descriptors().await;
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].display_name, "Username with password");
    }
}
