//! Credential kinds: registration metadata and form-bound construction
//!
//! A kind describes one concrete credential shape as a whole - display name,
//! icon, symbolic key - and knows how to build a record from bound form
//! fields. Kinds register in the process-wide [`KindRegistry`] at startup;
//! a listing UI queries the registry for [`KindDescriptor`]s.

mod registry;
mod username_password;

use serde::Deserialize;

use crate::credential::{CredentialScope, UsernamePasswordCredential};
use crate::crypto::SecretProtector;
use crate::error::Result;

pub use registry::KindRegistry;
pub use username_password::UsernamePasswordKind;

/// A credential kind available for selection.
///
/// Display metadata is constant per kind, not per record.
pub trait CredentialKind: Send + Sync {
    /// Stable symbolic lookup key
    fn symbol(&self) -> &'static str;

    /// Human-readable name shown in the kind selection list
    fn display_name(&self) -> &'static str;

    /// Icon identifier for the selection list
    fn icon_id(&self) -> &'static str;

    /// Build a record from bound form fields.
    ///
    /// Normalization of absent fields happens in the record constructor;
    /// this surface never validates.
    fn construct(
        &self,
        form: CredentialForm,
        protector: &SecretProtector,
    ) -> Result<UsernamePasswordCredential>;
}

/// Bound form fields for credential construction.
///
/// Every field is optional; the constructor and setter surface absorb
/// whatever is missing.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialForm {
    pub scope: Option<CredentialScope>,
    pub id: Option<String>,
    pub description: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub username_secret: Option<bool>,
}

impl std::fmt::Debug for CredentialForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialForm")
            .field("scope", &self.scope)
            .field("id", &self.id)
            .field("description", &self.description)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("username_secret", &self.username_secret)
            .finish()
    }
}

/// Display metadata for one registered kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindDescriptor {
    pub symbol: &'static str,
    pub display_name: &'static str,
    pub icon_id: &'static str,
}
