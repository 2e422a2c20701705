//! Process-wide registry of credential kinds

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{CredentialKind, KindDescriptor, UsernamePasswordKind};

/// Registry mapping symbolic keys to kind implementations.
///
/// Populated once at startup; queried by the listing UI and by stores
/// resolving form submissions.
pub struct KindRegistry {
    kinds: RwLock<HashMap<&'static str, Arc<dyn CredentialKind>>>,
}

impl KindRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            kinds: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with the built-in kinds registered
    pub fn with_builtin() -> Self {
        let mut kinds: HashMap<&'static str, Arc<dyn CredentialKind>> = HashMap::new();

        let builtin: Arc<dyn CredentialKind> = Arc::new(UsernamePasswordKind);
        kinds.insert(builtin.symbol(), builtin);

        Self {
            kinds: RwLock::new(kinds),
        }
    }

    /// Register a kind. A later registration under the same symbol wins.
    pub async fn register(&self, kind: Arc<dyn CredentialKind>) {
        let symbol = kind.symbol();
        let mut kinds = self.kinds.write().await;

        if kinds.insert(symbol, kind).is_some() {
            warn!("Replaced credential kind registration: {}", symbol);
        } else {
            debug!("Registered credential kind: {}", symbol);
        }
    }

    /// Look up a kind by its symbol
    pub async fn get(&self, symbol: &str) -> Option<Arc<dyn CredentialKind>> {
        self.kinds.read().await.get(symbol).cloned()
    }

    /// Display metadata for every registered kind, for the selection list
    pub async fn descriptors(&self) -> Vec<KindDescriptor> {
        let kinds = self.kinds.read().await;

        let mut descriptors: Vec<KindDescriptor> = kinds
            .values()
            .map(|kind| KindDescriptor {
                symbol: kind.symbol(),
                display_name: kind.display_name(),
                icon_id: kind.icon_id(),
            })
            .collect();

        descriptors.sort_by_key(|d| d.symbol);
        descriptors
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_kind_is_registered() {
        let registry = KindRegistry::with_builtin();

        let kind = registry.get("username_password").await.unwrap();
        assert_eq!(kind.display_name(), "Username with password");
    }

    #[tokio::test]
    async fn unknown_symbol_is_none() {
        let registry = KindRegistry::with_builtin();

        assert!(registry.get("certificate").await.is_none());
    }

    #[tokio::test]
    async fn descriptors_list_display_metadata() {
        let registry = KindRegistry::with_builtin();

        let descriptors = registry.descriptors().await;
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].symbol, "username_password");
        assert_eq!(descriptors[0].display_name, "Username with password");
        assert_eq!(descriptors[0].icon_id, "icon-credentials-userpass");
    }

    #[tokio::test]
    async fn duplicate_registration_replaces() {
        let registry = KindRegistry::with_builtin();
        registry.register(Arc::new(UsernamePasswordKind)).await;

        assert_eq!(registry.descriptors().await.len(), 1);
    }
}
