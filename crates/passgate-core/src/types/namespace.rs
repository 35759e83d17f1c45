//! Storage namespace type.

use std::fmt;

use crate::error::{Error, InvalidInputError};

/// A storage namespace that keeps one application's keys apart from another's.
///
/// Lowercase ASCII letters, digits, `-` and `_`; 1 to 64 characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace(pub(crate) String);

impl Namespace {
    const MAX_LEN: usize = 64;

    /// Create a new namespace, validating the format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();

        let reason = if s.is_empty() {
            Some("must not be empty")
        } else if s.len() > Self::MAX_LEN {
            Some("must be at most 64 characters")
        } else if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            Some("may only contain a-z, 0-9, '-' and '_'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidInputError::Namespace {
                value: s,
                reason: reason.to_string(),
            }
            .into()),
            None => Ok(Self(s)),
        }
    }

    /// Returns the fully qualified storage key for `name` in this namespace.
    pub fn key(&self, name: &str) -> String {
        format!("{}.{}", self.0, name)
    }

    /// Returns the namespace as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
