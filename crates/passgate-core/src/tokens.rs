//! Bearer token type.

use std::fmt;

/// An opaque bearer token proving an authenticated session.
///
/// Sent as `Authorization: Bearer <token>` on every request while the
/// session is active.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Create a new token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value.
    ///
    /// # Security
    ///
    /// Use only when constructing authorization headers or persisting the
    /// session.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `Authorization` header value for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Hide token value in Debug output
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthToken").field(&"[REDACTED]").finish()
    }
}
