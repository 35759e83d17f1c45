//! Session-facing traits used by the transport hooks and the route guard.

use crate::tokens::AuthToken;

/// Read-only view of whether a session is currently authenticated.
pub trait AuthStatus: Send + Sync {
    /// Returns true while a bearer token is held.
    fn is_authenticated(&self) -> bool;
}

/// Supplies the token to attach to the next outgoing request.
///
/// Read fresh for every request; returning `None` sends the request
/// unauthenticated.
pub trait TokenProvider: Send + Sync {
    /// The currently active token, if any.
    fn current_token(&self) -> Option<AuthToken>;
}

/// Drops the active credential after the backend rejects it.
pub trait CredentialInvalidator: Send + Sync {
    /// Clear the in-memory and persisted credential.
    fn invalidate(&self);
}

impl<T: AuthStatus + ?Sized> AuthStatus for std::sync::Arc<T> {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }
}

impl<T: AuthStatus + ?Sized> AuthStatus for &T {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }
}
