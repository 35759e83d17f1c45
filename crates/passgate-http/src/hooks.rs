//! Request and response hooks for the authorized transport.
//!
//! Hooks are composed once, in order, when the client is built. Request
//! hooks may change the outgoing request; response hooks only observe.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, StatusCode};
use tracing::{debug, warn};
use url::Url;

use passgate_core::{CredentialInvalidator, TokenProvider};

/// Transforms an outgoing request before it is sent.
pub trait RequestHook: Send + Sync {
    fn on_request(&self, request: &mut reqwest::Request);
}

/// Observes a response before it is handed back to the caller.
pub trait ResponseHook: Send + Sync {
    fn on_response(&self, response: &ResponseInfo<'_>);
}

/// What a response hook gets to see.
#[derive(Debug, Clone, Copy)]
pub struct ResponseInfo<'a> {
    pub method: &'a Method,
    pub url: &'a Url,
    pub status: StatusCode,
}

/// Attaches the current bearer token to every request.
///
/// The token is read from the provider at dispatch time, so a login or
/// logout takes effect for the very next request.
pub struct BearerAuth {
    provider: Arc<dyn TokenProvider>,
}

impl BearerAuth {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self { provider }
    }
}

impl RequestHook for BearerAuth {
    fn on_request(&self, request: &mut reqwest::Request) {
        let Some(token) = self.provider.current_token() else {
            return;
        };

        match HeaderValue::from_str(&token.bearer()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => {
                warn!(url = %request.url(), "Stored token is not a valid header value; sending unauthenticated");
            }
        }
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

/// Drops the credential when the backend answers 401.
///
/// Only clears state; navigation back to the login route happens when the
/// guard next sees the session as logged out.
pub struct InvalidateOnUnauthorized {
    target: Arc<dyn CredentialInvalidator>,
}

impl InvalidateOnUnauthorized {
    pub fn new(target: Arc<dyn CredentialInvalidator>) -> Self {
        Self { target }
    }
}

impl ResponseHook for InvalidateOnUnauthorized {
    fn on_response(&self, response: &ResponseInfo<'_>) {
        if response.status == StatusCode::UNAUTHORIZED {
            warn!(url = %response.url, "Unauthorized; clearing credential");
            self.target.invalidate();
        }
    }
}

impl fmt::Debug for InvalidateOnUnauthorized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidateOnUnauthorized")
            .finish_non_exhaustive()
    }
}

/// Logs every error response.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrors;

impl ResponseHook for LogErrors {
    fn on_response(&self, response: &ResponseInfo<'_>) {
        let status = response.status;
        if status.is_client_error() || status.is_server_error() {
            warn!(method = %response.method, url = %response.url, %status, "API error");
        } else {
            debug!(method = %response.method, url = %response.url, %status, "API response");
        }
    }
}
