//! Principal (user profile) and stored credential types.
//!
//! This module provides [`Principal`], the cached profile of the signed-in
//! user, and [`Credential`], the token/profile pair a session persists.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, InvalidInputError};
use crate::tokens::AuthToken;

/// The authenticated user's profile record.
///
/// The backend decides the shape of the profile; the only guarantee is that
/// it is a JSON object. Common fields have typed accessors.
///
/// # Example
///
/// ```
/// use passgate_core::Principal;
/// use serde_json::json;
///
/// let user = Principal::new(json!({"id": 1, "name": "Alice"})).unwrap();
/// assert_eq!(user.id(), Some(1));
/// assert_eq!(user.display_name(), Some("Alice"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Principal(Value);

impl Principal {
    /// Create a new `Principal` from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object.
    pub fn new(value: Value) -> Result<Self, Error> {
        if !value.is_object() {
            return Err(Error::InvalidInput(InvalidInputError::Other {
                message: "user profile must be a JSON object".to_string(),
            }));
        }
        Ok(Self(value))
    }

    /// Numeric user id, if present.
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// Login name, if present.
    pub fn username(&self) -> Option<&str> {
        self.0.get("username").and_then(Value::as_str)
    }

    /// Role name (`admin`, `guard`, ...), if present.
    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    /// The best name to show for this user.
    ///
    /// Tries `full_name`, then `name`, then `username`.
    pub fn display_name(&self) -> Option<&str> {
        ["full_name", "name", "username"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
    }

    /// Get a field from the profile.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a reference to the inner JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume and return the inner JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Serialize for Principal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Principal::new(value).map_err(serde::de::Error::custom)
    }
}

/// A bearer token together with the cached profile of its owner.
///
/// The token is always present; a session holding a `Credential` is
/// authenticated. The principal may be absent when the login flow did not
/// return a profile or the stored profile was unreadable.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    /// The bearer token.
    pub token: AuthToken,
    /// The user profile, if known.
    pub principal: Option<Principal>,
}

impl Credential {
    /// Create a new credential.
    pub fn new(token: AuthToken, principal: Option<Principal>) -> Self {
        Self { token, principal }
    }
}
