//! Application profiles for the two consoles sharing the backend.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};
use crate::guard::{Route, RouteTable};
use crate::types::Namespace;

/// Path of the login route in both consoles.
pub const LOGIN_PATH: &str = "/login";

/// Which client application a session belongs to.
///
/// Each profile owns a distinct storage namespace, so the admin console and
/// the guard console never read each other's credentials even when they
/// share one storage file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppProfile {
    /// Administrative console.
    Admin,
    /// Field-scanning console used by guards at the gate.
    Guard,
}

impl AppProfile {
    /// All profiles.
    pub const ALL: [AppProfile; 2] = [AppProfile::Admin, AppProfile::Guard];

    /// Short name, also used as the storage namespace.
    pub fn name(&self) -> &'static str {
        match self {
            AppProfile::Admin => "admin",
            AppProfile::Guard => "guard",
        }
    }

    /// Storage namespace for this profile.
    pub fn namespace(&self) -> Namespace {
        Namespace(self.name().to_string())
    }

    /// The login route.
    pub fn login_path(&self) -> &'static str {
        LOGIN_PATH
    }

    /// Route table for this console.
    pub fn routes(&self) -> RouteTable {
        let (public, protected): (&[&str], &[&str]) = match self {
            AppProfile::Admin => (
                &[LOGIN_PATH],
                &["/", "/passes", "/statistics", "/users", "/audit"],
            ),
            AppProfile::Guard => (&[LOGIN_PATH], &["/", "/result/:passId"]),
        };

        let mut table = RouteTable::new();
        for pattern in public {
            table.push(static_route(pattern, false));
        }
        for pattern in protected {
            table.push(static_route(pattern, true));
        }
        table
    }
}

// Patterns above are literals known to be valid.
fn static_route(pattern: &str, requires_auth: bool) -> Route {
    match Route::new(pattern, requires_auth) {
        Ok(route) => route,
        Err(err) => unreachable!("built-in route {pattern} is invalid: {err}"),
    }
}

impl fmt::Display for AppProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AppProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(AppProfile::Admin),
            "guard" | "scanner" => Ok(AppProfile::Guard),
            _ => Err(InvalidInputError::AppProfile {
                value: s.to_string(),
            }
            .into()),
        }
    }
}
