//! API base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated backend base URL.
///
/// Must be an absolute `http` or `https` URL with a host and without a query
/// string or fragment. A trailing slash is removed, so endpoint paths can be
/// joined without producing `//`.
///
/// # Example
///
/// ```
/// use passgate_core::ApiUrl;
///
/// let api = ApiUrl::new("http://localhost:8000/").unwrap();
/// assert_eq!(api.endpoint("/api/auth/login"), "http://localhost:8000/api/auth/login");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiUrl(Url);

impl ApiUrl {
    /// Create a new API URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::ApiUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        // Normalize: remove trailing slash
        let mut normalized = url;
        let trimmed = normalized.path().trim_end_matches('/').to_string();
        normalized.set_path(&trimmed);

        Ok(Self(normalized))
    }

    /// Returns the absolute URL for an endpoint path such as `/api/passes/`.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        let invalid = |reason: &str| -> Error {
            InvalidInputError::ApiUrl {
                value: original.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        if url.cannot_be_a_base() {
            return Err(invalid("must be an absolute URL"));
        }

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("must use http or https"));
        }

        if url.host_str().is_none() {
            return Err(invalid("must have a host"));
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("must not contain a query or fragment"));
        }

        Ok(())
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApiUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ApiUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for ApiUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiUrl::new(&s).map_err(serde::de::Error::custom)
    }
}
