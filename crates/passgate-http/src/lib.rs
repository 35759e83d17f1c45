//! passgate-http - authorized transport and session state.
//!
//! All authenticated traffic flows through the [`AuthorizedClient`] owned by
//! a [`Session`]. The client attaches the session's bearer token to every
//! request and clears the session when the backend answers 401.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use passgate_core::{ApiUrl, AppProfile, Navigator, RouteGuard};
//! use passgate_http::Session;
//! use passgate_store::FileStorage;
//!
//! # async fn example() -> Result<(), passgate_core::Error> {
//! let api = ApiUrl::new("http://localhost:8000")?;
//! let storage = Arc::new(FileStorage::new("/var/lib/passgate"));
//! let session = Session::open(api, storage, AppProfile::Guard)?;
//!
//! let profile = AppProfile::Guard;
//! let mut nav = Navigator::new(RouteGuard::new(
//!     session.clone(),
//!     profile.routes(),
//!     profile.login_path(),
//! ));
//! println!("{:?}", nav.navigate("/"));
//! # Ok(())
//! # }
//! ```

mod client;
pub mod endpoints;
pub mod hooks;
mod session;

pub use client::{ApiResponse, AuthorizedClient, ClientBuilder};
pub use hooks::{
    BearerAuth, InvalidateOnUnauthorized, LogErrors, RequestHook, ResponseHook, ResponseInfo,
};
pub use session::{LOGIN_FAILED, Session, SessionSnapshot};

pub use reqwest::{Method, StatusCode};
