//! The username/password credential record

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CredentialScope;
use crate::crypto::{SecretHandle, SecretProtector};
use crate::error::Result;

/// A username paired with a protected password.
///
/// The password goes through the [`SecretProtector`] at construction, so the
/// record never holds plaintext. Username and password are fixed for the
/// record's lifetime; only the description (through the owning store) and the
/// `username_secret` flag may change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsernamePasswordCredential {
    /// Visibility scope; `None` means the host default.
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<CredentialScope>,

    /// Unique identifier, generated when absent at construction.
    id: String,

    /// Free-text description; not security sensitive.
    #[serde(default)]
    description: String,

    /// The username. Empty string stands in for absent input.
    #[serde(default)]
    username: String,

    /// The protected password.
    password: SecretHandle,

    /// Whether the username itself should be treated as sensitive.
    ///
    /// Absent from state persisted before the flag existed; those records
    /// normalize to `true` on load so they keep behaving as before. `None`
    /// is observable only between raw deserialization and the fixup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username_secret: Option<bool>,
}

impl UsernamePasswordCredential {
    /// Build a record from form input.
    ///
    /// Absent inputs are normalized, never rejected: a missing id gets a
    /// generated UUID, a missing username becomes the empty string, and a
    /// missing password wraps the empty string. The only failure path is the
    /// protector's own encryption error, which passes through untouched.
    pub fn new(
        scope: Option<CredentialScope>,
        id: Option<String>,
        description: Option<String>,
        username: Option<String>,
        password: Option<String>,
        protector: &SecretProtector,
    ) -> Result<Self> {
        let id = id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self {
            scope,
            id,
            description: description.unwrap_or_default(),
            username: username.unwrap_or_default(),
            password: protector.wrap(password.as_deref().unwrap_or(""))?,
            username_secret: Some(false),
        })
    }

    /// One-time adjustment applied right after a record is loaded.
    ///
    /// Records persisted before the `username_secret` flag existed carry no
    /// value for it and default to `true`; an explicitly stored value,
    /// including `false`, is left alone. Running this on an already
    /// normalized record is a no-op.
    pub fn normalize_after_load(&mut self) -> &mut Self {
        if self.username_secret.is_none() {
            self.username_secret = Some(true);
        }
        self
    }

    pub fn scope(&self) -> Option<CredentialScope> {
        self.scope
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The username. Never absent; empty when none was supplied.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The protected password. Plaintext is recoverable only through
    /// [`SecretProtector::reveal`].
    pub fn password(&self) -> &SecretHandle {
        &self.password
    }

    /// Whether the username should be masked like a secret.
    ///
    /// Advisory metadata for form rendering; nothing in this crate branches
    /// on it.
    pub fn is_username_secret(&self) -> bool {
        self.username_secret.unwrap_or(false)
    }

    /// Form-binding setter for the username secrecy flag.
    pub fn set_username_secret(&mut self, username_secret: bool) {
        self.username_secret = Some(username_secret);
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }
}

/// Identity is the id alone; field contents do not participate.
impl PartialEq for UsernamePasswordCredential {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UsernamePasswordCredential {}

impl std::hash::Hash for UsernamePasswordCredential {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::MasterKey;

    fn protector() -> SecretProtector {
        SecretProtector::new(MasterKey::new([7u8; 32]))
    }

    fn build(
        username: Option<&str>,
        password: Option<&str>,
        protector: &SecretProtector,
    ) -> UsernamePasswordCredential {
        UsernamePasswordCredential::new(
            Some(CredentialScope::Global),
            Some("cred-1".to_string()),
            Some("svc".to_string()),
            username.map(String::from),
            password.map(String::from),
            protector,
        )
        .unwrap()
    }

    #[test]
    fn absent_username_becomes_empty() {
        let protector = protector();
        let cred = build(None, Some("hunter2"), &protector);

        assert_eq!(cred.username(), "");
    }

    #[test]
    fn absent_password_wraps_empty_string() {
        let protector = protector();
        let cred = build(Some("bob"), None, &protector);

        assert_eq!(protector.reveal(cred.password()).unwrap().expose(), "");
    }

    #[test]
    fn construction_roundtrip() {
        let protector = protector();
        let cred = build(Some("bob"), Some("hunter2"), &protector);

        assert_eq!(cred.scope(), Some(CredentialScope::Global));
        assert_eq!(cred.id(), "cred-1");
        assert_eq!(cred.description(), "svc");
        assert_eq!(cred.username(), "bob");
        assert_eq!(
            protector.reveal(cred.password()).unwrap().expose(),
            "hunter2"
        );
    }

    #[test]
    fn generates_id_when_absent() {
        let protector = protector();
        let cred = UsernamePasswordCredential::new(
            Some(CredentialScope::Global),
            None,
            Some("svc".to_string()),
            Some("bob".to_string()),
            Some("hunter2".to_string()),
            &protector,
        )
        .unwrap();

        assert!(!cred.id().is_empty());
        assert_eq!(cred.username(), "bob");
        assert!(!cred.is_username_secret());
    }

    #[test]
    fn empty_id_treated_as_absent() {
        let protector = protector();
        let cred = UsernamePasswordCredential::new(
            None,
            Some(String::new()),
            None,
            None,
            None,
            &protector,
        )
        .unwrap();

        assert!(!cred.id().is_empty());
    }

    #[test]
    fn fresh_record_defaults_flag_off() {
        let protector = protector();
        let cred = build(Some("bob"), Some("hunter2"), &protector);

        assert!(!cred.is_username_secret());
    }

    #[test]
    fn setter_overrides_flag() {
        let protector = protector();
        let mut cred = build(Some("bob"), Some("hunter2"), &protector);

        cred.set_username_secret(true);
        assert!(cred.is_username_secret());

        cred.set_username_secret(false);
        assert!(!cred.is_username_secret());
    }

    #[test]
    fn fixup_defaults_missing_flag_to_true() {
        let protector = protector();
        let cred = build(Some("alice"), Some("hunter2"), &protector);

        // Strip the flag to simulate state persisted before it existed
        let mut raw = serde_json::to_value(&cred).unwrap();
        raw.as_object_mut().unwrap().remove("username_secret");

        let mut legacy: UsernamePasswordCredential = serde_json::from_value(raw).unwrap();
        legacy.normalize_after_load();
        assert!(legacy.is_username_secret());

        // Idempotent on re-entry
        legacy.normalize_after_load();
        assert!(legacy.is_username_secret());
    }

    #[test]
    fn fixup_preserves_explicit_false() {
        let protector = protector();
        let cred = build(Some("alice"), Some("hunter2"), &protector);

        let json = serde_json::to_string(&cred).unwrap();
        let mut reloaded: UsernamePasswordCredential = serde_json::from_str(&json).unwrap();
        reloaded.normalize_after_load();

        assert!(!reloaded.is_username_secret());
    }

    #[test]
    fn serialized_record_carries_explicit_flag() {
        let protector = protector();
        let cred = build(Some("bob"), Some("hunter2"), &protector);

        let raw = serde_json::to_value(&cred).unwrap();
        assert_eq!(raw["username_secret"], serde_json::Value::Bool(false));
        // Password persists as the opaque handle, never plaintext
        assert_ne!(raw["password"], serde_json::Value::String("hunter2".into()));
    }

    #[test]
    fn identity_is_by_id() {
        let protector = protector();
        let a = build(Some("bob"), Some("hunter2"), &protector);
        let b = build(Some("alice"), Some("other"), &protector);

        assert_eq!(a, b); // same id, different contents
    }
}
