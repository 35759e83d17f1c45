//! Login credentials type.

use std::fmt;

/// Login credentials for the authentication exchange.
///
/// Holds the identifier (username) and secret (password) sent to the login
/// endpoint.
///
/// # Security
///
/// The secret is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use passgate_core::Credentials;
///
/// let creds = Credentials::new("alice", "correct horse");
/// assert_eq!(creds.identifier(), "alice");
/// ```
#[derive(Clone)]
pub struct Credentials {
    identifier: String,
    secret: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Returns the identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the secret.
    ///
    /// # Security
    ///
    /// Use this only when constructing the login request.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
