//! Session state: login, logout and the credential the transport attaches.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, instrument, warn};

use passgate_core::error::{AuthError, Error};
use passgate_core::{
    ApiUrl, AppProfile, AuthStatus, AuthToken, Credential, CredentialInvalidator, Credentials,
    KeyValueStorage, Principal, Result, TokenProvider,
};
use passgate_store::CredentialStore;

use crate::client::{AuthorizedClient, ClientBuilder};
use crate::endpoints::{LOGIN, LoginRequest, LoginResponse};
use crate::hooks::{BearerAuth, InvalidateOnUnauthorized, LogErrors};

/// Message recorded when the backend gives no specific reason for a failed login.
pub const LOGIN_FAILED: &str = "Login failed";

/// Point-in-time copy of a session's state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub credential: Option<Credential>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// True while a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }
}

/// The authoritative in-memory view of one application's authentication.
///
/// A `Session` owns the [`AuthorizedClient`] every request should go
/// through. The client reads the session's token fresh for each request and
/// clears the session when the backend answers 401, so the session, the
/// persisted credential and the `Authorization` header never disagree.
///
/// Sessions are cheap to clone; clones share state.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use passgate_core::{ApiUrl, AppProfile};
/// use passgate_http::Session;
/// use passgate_store::MemoryStorage;
///
/// # async fn example() -> Result<(), passgate_core::Error> {
/// let api = ApiUrl::new("http://localhost:8000")?;
/// let session = Session::open(api, Arc::new(MemoryStorage::new()), AppProfile::Admin)?;
///
/// if session.login("alice", "secret").await {
///     let stats: serde_json::Value = session.client().get("/api/admin/statistics").await?;
///     println!("{stats}");
/// } else {
///     eprintln!("{}", session.last_error().unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
    client: AuthorizedClient,
}

struct SessionInner {
    store: CredentialStore,
    state: RwLock<SessionState>,
}

#[derive(Default)]
struct SessionState {
    credential: Option<Credential>,
    last_error: Option<String>,
    logins_in_flight: usize,
    login_generation: u64,
}

impl Session {
    /// Create a session for `api`, restoring any credential held by `store`.
    pub fn new(api: ApiUrl, store: CredentialStore) -> Result<Self> {
        Self::with_client(AuthorizedClient::builder(api), store)
    }

    /// Create a session for one application profile on shared storage.
    pub fn open(api: ApiUrl, storage: Arc<dyn KeyValueStorage>, profile: AppProfile) -> Result<Self> {
        Self::new(api, CredentialStore::new(storage, profile.namespace()))
    }

    /// Create a session whose transport is built from `builder`.
    ///
    /// Bearer attachment runs before any request hooks already on the
    /// builder; error logging and 401 invalidation run before its response
    /// hooks.
    pub fn with_client(builder: ClientBuilder, store: CredentialStore) -> Result<Self> {
        let credential = store.load();
        debug!(
            namespace = %store.namespace(),
            restored = credential.is_some(),
            "Session initialized"
        );

        let inner = Arc::new(SessionInner {
            store,
            state: RwLock::new(SessionState {
                credential,
                ..SessionState::default()
            }),
        });

        let client = builder
            .prepend_response_hook(InvalidateOnUnauthorized::new(inner.clone()))
            .prepend_response_hook(LogErrors)
            .prepend_request_hook(BearerAuth::new(inner.clone()))
            .build()?;

        Ok(Self { inner, client })
    }

    /// Exchange an identifier and secret for a session token.
    ///
    /// Returns `true` on success. On failure returns `false` and records the
    /// most specific message available in [`last_error`](Self::last_error);
    /// this method never returns an error.
    #[instrument(skip(self, secret), fields(namespace = %self.inner.store.namespace()))]
    pub async fn login(&self, identifier: &str, secret: &str) -> bool {
        self.login_with(&Credentials::new(identifier, secret)).await
    }

    /// [`login`](Self::login) with prebuilt [`Credentials`].
    ///
    /// Overlapping logins on clones of one session keep `loading` true until
    /// the last of them finishes. A failure is recorded only if no newer
    /// login has started since; a success always clears the error.
    pub async fn login_with(&self, credentials: &Credentials) -> bool {
        let in_flight = self.inner.begin_login();

        match self.exchange(credentials).await {
            Ok(credential) => {
                self.inner.establish(credential);
                info!(identifier = credentials.identifier(), "Logged in");
                true
            }
            Err(err) => {
                let message = err.detail().unwrap_or(LOGIN_FAILED).to_string();
                info!(identifier = credentials.identifier(), error = %err, "Login failed");
                let mut state = self.inner.write();
                if state.login_generation == in_flight.generation {
                    state.last_error = Some(message);
                }
                false
            }
        }
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<Credential> {
        let request = LoginRequest {
            username: credentials.identifier(),
            password: credentials.secret(),
        };

        let response: LoginResponse = self.client.post(LOGIN, &request).await?;

        if response.access_token.is_empty() {
            return Err(Error::Auth(AuthError::InvalidCredentials));
        }

        let principal = match response.user {
            Some(user) if !user.is_null() => match Principal::new(user) {
                Ok(principal) => Some(principal),
                Err(err) => {
                    debug!(error = %err, "Ignoring malformed user profile in login response");
                    None
                }
            },
            _ => None,
        };

        Ok(Credential::new(AuthToken::new(response.access_token), principal))
    }

    /// End the session. Calling this while logged out does nothing.
    pub fn logout(&self) {
        if self.inner.clear() {
            info!(namespace = %self.inner.store.namespace(), "Logged out");
        }
    }

    /// True while a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().credential.is_some()
    }

    /// True while a login exchange is in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.read().logins_in_flight > 0
    }

    /// Message from the most recent failed login.
    pub fn last_error(&self) -> Option<String> {
        self.inner.read().last_error.clone()
    }

    /// The cached profile of the signed-in user.
    pub fn principal(&self) -> Option<Principal> {
        self.inner
            .read()
            .credential
            .as_ref()
            .and_then(|c| c.principal.clone())
    }

    /// A copy of the whole session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.read();
        SessionSnapshot {
            credential: state.credential.clone(),
            loading: state.logins_in_flight > 0,
            last_error: state.last_error.clone(),
        }
    }

    /// The transport that attaches this session's token.
    pub fn client(&self) -> &AuthorizedClient {
        &self.client
    }

    /// The store this session persists to.
    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }
}

impl AuthStatus for Session {
    fn is_authenticated(&self) -> bool {
        Session::is_authenticated(self)
    }
}

impl TokenProvider for Session {
    fn current_token(&self) -> Option<AuthToken> {
        self.inner.current_token()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.read();
        f.debug_struct("Session")
            .field("namespace", self.inner.store.namespace())
            .field("authenticated", &state.credential.is_some())
            .field("loading", &(state.logins_in_flight > 0))
            .field("api", self.client.api())
            .finish()
    }
}

impl SessionInner {
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_login(&self) -> LoginInFlight<'_> {
        let mut state = self.write();
        state.logins_in_flight += 1;
        state.login_generation += 1;
        state.last_error = None;
        LoginInFlight {
            inner: self,
            generation: state.login_generation,
        }
    }

    fn establish(&self, credential: Credential) {
        if let Err(err) = self.store.save(&credential) {
            warn!(error = %err, "Could not persist credential; session will not survive a restart");
        }
        let mut state = self.write();
        state.credential = Some(credential);
        state.last_error = None;
    }

    /// Drop the credential from memory and storage. Returns whether one was held.
    fn clear(&self) -> bool {
        let had_credential = self.write().credential.take().is_some();
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "Could not clear persisted credential");
        }
        had_credential
    }
}

impl AuthStatus for SessionInner {
    fn is_authenticated(&self) -> bool {
        self.read().credential.is_some()
    }
}

impl TokenProvider for SessionInner {
    fn current_token(&self) -> Option<AuthToken> {
        self.read().credential.as_ref().map(|c| c.token.clone())
    }
}

impl CredentialInvalidator for SessionInner {
    fn invalidate(&self) {
        if self.clear() {
            warn!(namespace = %self.store.namespace(), "Session invalidated by the backend");
        }
    }
}

/// Counts one login as in flight until dropped.
struct LoginInFlight<'a> {
    inner: &'a SessionInner,
    generation: u64,
}

impl Drop for LoginInFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.write();
        state.logins_in_flight = state.logins_in_flight.saturating_sub(1);
    }
}
