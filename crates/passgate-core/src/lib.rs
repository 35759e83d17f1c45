//! passgate-core - session, credential and route-guard primitives.
//!
//! This crate holds the pieces of the passgate client stack that do not
//! touch the network: validated value types, the unified error, the traits
//! the storage/transport/guard layers meet at, the route guard itself and
//! the [`Loader`] used to track asynchronous operations.
//!
//! The HTTP side lives in `passgate-http`; durable storage in
//! `passgate-store`.

pub mod app;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod loader;
pub mod principal;
pub mod tokens;
pub mod traits;
pub mod types;

pub use app::AppProfile;
pub use credentials::Credentials;
pub use error::{Error, ErrorDetail};
pub use guard::{
    NavigationIntent, NavigationOutcome, Navigator, Resolution, Route, RouteGuard, RouteTable,
};
pub use loader::{Loader, OperationState};
pub use principal::{Credential, Principal};
pub use tokens::AuthToken;
pub use traits::{AuthStatus, CredentialInvalidator, KeyValueStorage, TokenProvider};
pub use types::{ApiUrl, Namespace};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
