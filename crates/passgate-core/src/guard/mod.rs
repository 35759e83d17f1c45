//! Navigation guard.
//!
//! The guard decides, before every navigation, whether the destination may be
//! entered. The decision is synchronous and uses only the cached session
//! state: a token that the backend no longer accepts is discovered on the
//! first request that comes back 401, after which the session is cleared and
//! the next guarded navigation redirects to the login route.

mod navigator;
mod route;

pub use navigator::{NavigationOutcome, Navigator};
pub use route::{NavigationIntent, Route, RouteMatch, RouteTable};

use tracing::debug;

use crate::traits::AuthStatus;

/// The guard's verdict for one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Enter the requested destination.
    Proceed,
    /// Cancel the requested destination and go here instead.
    Redirect(String),
}

/// Consults session state before entry to protected destinations.
#[derive(Debug, Clone)]
pub struct RouteGuard<A> {
    auth: A,
    routes: RouteTable,
    login_path: String,
}

impl<A: AuthStatus> RouteGuard<A> {
    /// Create a guard over `routes` that redirects to `login_path`.
    pub fn new(auth: A, routes: RouteTable, login_path: impl Into<String>) -> Self {
        Self {
            auth,
            routes,
            login_path: login_path.into(),
        }
    }

    /// The route table this guard consults.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Where unauthenticated visitors are sent.
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Build the navigation intent for `path` from the route table.
    pub fn intent(&self, path: &str) -> NavigationIntent {
        self.routes.intent(path)
    }

    /// Decide one navigation attempt.
    pub fn check(&self, intent: &NavigationIntent) -> Resolution {
        if !intent.requires_auth || self.auth.is_authenticated() {
            Resolution::Proceed
        } else {
            Resolution::Redirect(self.login_path.clone())
        }
    }

    /// Navigation-facility hook, invoked before each transition.
    ///
    /// `resolve` is called exactly once with the verdict.
    pub fn before_each<F>(&self, to: &NavigationIntent, from: Option<&str>, resolve: F)
    where
        F: FnOnce(Resolution),
    {
        let resolution = self.check(to);
        debug!(
            to = %to.destination,
            from = from.unwrap_or("<start>"),
            requires_auth = to.requires_auth,
            ?resolution,
            "Guarded navigation"
        );
        resolve(resolution);
    }
}
