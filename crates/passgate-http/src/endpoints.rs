//! Backend endpoint paths and wire types used by the session layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Authentication exchange.
pub const LOGIN: &str = "/api/auth/login";

/// Request body for the login exchange.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response from the login exchange.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Error body returned by the backend.
///
/// `detail` is either a message string or, for request validation failures,
/// a list of `{loc, msg, type}` objects.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// The most specific human-readable message in the body.
    pub fn message(self) -> Option<String> {
        let from_detail = match self.detail {
            Some(Value::String(detail)) => Some(detail),
            Some(Value::Array(items)) => items.into_iter().find_map(|item| {
                item.get("msg")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            }),
            _ => None,
        };

        from_detail
            .or(self.message)
            .filter(|message| !message.trim().is_empty())
    }
}
