//! Core traits at the seams between storage, session, transport and guard.

mod auth;
mod storage;

pub use auth::{AuthStatus, CredentialInvalidator, TokenProvider};
pub use storage::KeyValueStorage;
