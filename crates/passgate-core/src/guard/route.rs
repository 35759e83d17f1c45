//! Route table and path matching.

use std::collections::BTreeMap;

use crate::error::{Error, InvalidInputError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

/// A declared destination and whether entering it requires a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pattern: String,
    segments: Vec<Segment>,
    requires_auth: bool,
}

impl Route {
    /// Create a route from a pattern such as `/result/:passId`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not absolute or has an unnamed
    /// parameter.
    pub fn new(pattern: &str, requires_auth: bool) -> Result<Self, Error> {
        if !pattern.starts_with('/') {
            return Err(InvalidInputError::RoutePattern {
                value: pattern.to_string(),
                reason: "must start with '/'".to_string(),
            }
            .into());
        }

        let segments = split_path(pattern)
            .map(|segment| match segment.strip_prefix(':') {
                Some("") => Err(Error::from(InvalidInputError::RoutePattern {
                    value: pattern.to_string(),
                    reason: "parameter segment needs a name".to_string(),
                })),
                Some(name) => Ok(Segment::Param(name.to_string())),
                None => Ok(Segment::Static(segment.to_string())),
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            requires_auth,
        })
    }

    /// A route anyone may enter.
    pub fn public(pattern: &str) -> Result<Self, Error> {
        Self::new(pattern, false)
    }

    /// A route that requires an authenticated session.
    pub fn protected(pattern: &str) -> Result<Self, Error> {
        Self::new(pattern, true)
    }

    /// The pattern this route was declared with.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether entering this route requires a session.
    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    /// Match a concrete path, returning captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = split_path(strip_suffixes(path)).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Static(expected) if expected == part => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

/// A matched route and its captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: BTreeMap<String, String>,
}

/// An ordered set of routes; the first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route.
    pub fn with(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Append a route in place.
    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Find the first route matching `path`.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route
                .matches(path)
                .map(|params| RouteMatch { route, params })
        })
    }

    /// Build the navigation intent for `path`.
    ///
    /// Paths with no matching route carry no restriction.
    pub fn intent(&self, path: &str) -> NavigationIntent {
        let requires_auth = self
            .resolve(path)
            .is_some_and(|matched| matched.route.requires_auth());
        NavigationIntent::new(path, requires_auth)
    }

    /// Iterate over the declared routes in order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

/// A requested destination and whether it requires a session.
///
/// Consumed once by the guard; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub destination: String,
    pub requires_auth: bool,
}

impl NavigationIntent {
    /// Create a new intent.
    pub fn new(destination: impl Into<String>, requires_auth: bool) -> Self {
        Self {
            destination: destination.into(),
            requires_auth,
        }
    }
}

fn strip_suffixes(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
