//! Namespaced persistence of the session credential.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use passgate_core::error::{Error, StorageError};
use passgate_core::{AuthToken, Credential, KeyValueStorage, Namespace, Principal, Result};

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Persists one application's token and user profile.
///
/// Both entries live under the store's [`Namespace`] (`<namespace>.token`
/// and `<namespace>.user`); the same key names are used for reading and
/// writing. Loading never fails: missing or unreadable data means "logged
/// out", and an unreadable profile means "no profile".
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn KeyValueStorage>,
    namespace: Namespace,
}

impl CredentialStore {
    /// Create a store for `namespace` on top of `storage`.
    pub fn new(storage: Arc<dyn KeyValueStorage>, namespace: Namespace) -> Self {
        Self { storage, namespace }
    }

    /// The namespace this store writes under.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn token_key(&self) -> String {
        self.namespace.key(TOKEN_KEY)
    }

    fn user_key(&self) -> String {
        self.namespace.key(USER_KEY)
    }

    /// Write the token and profile in one storage operation.
    #[instrument(skip(self, credential), fields(namespace = %self.namespace))]
    pub fn save(&self, credential: &Credential) -> Result<()> {
        let user = match &credential.principal {
            Some(principal) => serde_json::to_string(principal.as_value()),
            None => serde_json::to_string(&Value::Null),
        }
        .map_err(|e| {
            Error::Storage(StorageError::Serialization {
                message: e.to_string(),
            })
        })?;

        let token_key = self.token_key();
        let user_key = self.user_key();
        self.storage.set_many(&[
            (token_key.as_str(), credential.token.as_str()),
            (user_key.as_str(), user.as_str()),
        ])?;

        debug!(has_principal = credential.principal.is_some(), "Credential saved");
        Ok(())
    }

    /// Read the last saved credential.
    ///
    /// Returns `None` when nothing is stored or storage cannot be read.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub fn load(&self) -> Option<Credential> {
        let token = match self.storage.get(&self.token_key()) {
            Ok(Some(token)) if !token.is_empty() => AuthToken::new(token),
            Ok(_) => return None,
            Err(err) => {
                warn!(error = %err, "Could not read stored token; starting logged out");
                return None;
            }
        };

        Some(Credential::new(token, self.load_principal()))
    }

    fn load_principal(&self) -> Option<Principal> {
        let raw = match self.storage.get(&self.user_key()) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "Could not read stored profile");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Null) => None,
            Ok(value) => match Principal::new(value) {
                Ok(principal) => Some(principal),
                Err(err) => {
                    debug!(error = %err, "Stored profile is not an object; ignoring it");
                    None
                }
            },
            Err(err) => {
                debug!(error = %err, "Stored profile is not valid JSON; ignoring it");
                None
            }
        }
    }

    /// Remove the token and profile.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub fn clear(&self) -> Result<()> {
        let token_key = self.token_key();
        let user_key = self.user_key();
        self.storage
            .remove_many(&[token_key.as_str(), user_key.as_str()])?;
        debug!("Credential cleared");
        Ok(())
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
