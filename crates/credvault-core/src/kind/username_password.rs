//! The built-in username/password credential kind

use super::{CredentialForm, CredentialKind};
use crate::credential::UsernamePasswordCredential;
use crate::crypto::SecretProtector;
use crate::error::Result;

/// Username plus password, the one kind this crate ships with.
#[derive(Debug, Default, Clone, Copy)]
pub struct UsernamePasswordKind;

impl CredentialKind for UsernamePasswordKind {
    fn symbol(&self) -> &'static str {
        "username_password"
    }

    fn display_name(&self) -> &'static str {
        "Username with password"
    }

    fn icon_id(&self) -> &'static str {
        "icon-credentials-userpass"
    }

    fn construct(
        &self,
        form: CredentialForm,
        protector: &SecretProtector,
    ) -> Result<UsernamePasswordCredential> {
        let mut credential = UsernamePasswordCredential::new(
            form.scope,
            form.id,
            form.description,
            form.username,
            form.password,
            protector,
        )?;

        // The secrecy flag binds through the setter, after construction
        if let Some(username_secret) = form.username_secret {
            credential.set_username_secret(username_secret);
        }

        Ok(credential)
    }
}
