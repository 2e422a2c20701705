//! Credential visibility scoping

use serde::{Deserialize, Serialize};

/// Where a credential is visible to consumers.
///
/// Set once at creation and carried opaquely from then on; resolving what
/// each scope actually grants is the host's job, not this crate's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialScope {
    /// Visible to every consumer of the owning store
    Global,
    /// Restricted to the automation server itself
    System,
    /// Restricted to the owning user
    User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CredentialScope::Global).unwrap(),
            "\"global\""
        );
        assert_eq!(
            serde_json::from_str::<CredentialScope>("\"system\"").unwrap(),
            CredentialScope::System
        );
    }
}
