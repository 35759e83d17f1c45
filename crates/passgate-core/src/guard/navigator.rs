//! Minimal navigation facility driven by the route guard.

use tracing::{debug, warn};

use crate::traits::AuthStatus;

use super::{Resolution, RouteGuard};

/// What happened to a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The requested destination was entered.
    Entered(String),
    /// The requested destination was cancelled and the login route entered instead.
    Redirected { requested: String, to: String },
    /// Neither the destination nor the redirect target could be entered.
    ///
    /// Only happens when the login route itself is declared protected.
    Blocked { requested: String },
}

/// Tracks the current location and runs the guard before every transition.
///
/// A destination is entered only after the guard resolves `Proceed`; a
/// cancelled destination never becomes the current location.
#[derive(Debug)]
pub struct Navigator<A> {
    guard: RouteGuard<A>,
    current: Option<String>,
}

impl<A: AuthStatus> Navigator<A> {
    /// Create a navigator with no current location.
    pub fn new(guard: RouteGuard<A>) -> Self {
        Self {
            guard,
            current: None,
        }
    }

    /// The guard this navigator consults.
    pub fn guard(&self) -> &RouteGuard<A> {
        &self.guard
    }

    /// The location most recently entered.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Request a transition to `path`.
    pub fn navigate(&mut self, path: &str) -> NavigationOutcome {
        match self.resolve(path) {
            Resolution::Proceed => {
                self.current = Some(path.to_string());
                NavigationOutcome::Entered(path.to_string())
            }
            Resolution::Redirect(target) => match self.resolve(&target) {
                Resolution::Proceed => {
                    debug!(requested = path, to = %target, "Navigation redirected");
                    self.current = Some(target.clone());
                    NavigationOutcome::Redirected {
                        requested: path.to_string(),
                        to: target,
                    }
                }
                Resolution::Redirect(_) => {
                    warn!(requested = path, login = %target, "Login route is itself guarded");
                    NavigationOutcome::Blocked {
                        requested: path.to_string(),
                    }
                }
            },
        }
    }

    fn resolve(&self, path: &str) -> Resolution {
        let intent = self.guard.intent(path);
        let mut verdict = None;
        self.guard
            .before_each(&intent, self.current.as_deref(), |r| verdict = Some(r));
        settle(verdict, self.guard.login_path())
    }
}

/// An unresolved navigation is treated as a redirect to the login route.
fn settle(verdict: Option<Resolution>, login_path: &str) -> Resolution {
    verdict.unwrap_or_else(|| Resolution::Redirect(login_path.to_string()))
}
