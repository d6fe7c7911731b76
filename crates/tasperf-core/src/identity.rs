//! # Identifier Newtypes
//!
//! `EntryUuid` names a transparency-log entry; `BearerToken` is the OIDC
//! access token shared by every signing VU. Both are opaque strings on the
//! wire; the newtypes keep them from being confused with each other or with
//! arbitrary response text.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Identifier of a log entry, as returned in the `Location` header of a
/// successful append. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryUuid(String);

impl EntryUuid {
    /// Build an identifier from a raw string. Surrounding whitespace is
    /// trimmed; an empty result is rejected.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Parse the identifier from a `Location` header value.
    ///
    /// The identifier is exactly the final `/`-delimited path segment.
    /// A value ending in `/` has an empty final segment and yields `None`.
    ///
    /// ```
    /// use tasperf_core::EntryUuid;
    /// let id = EntryUuid::from_location("https://rekor/api/v1/log/entries/1234-uuid").unwrap();
    /// assert_eq!(id.as_str(), "1234-uuid");
    /// ```
    pub fn from_location(location: &str) -> Option<Self> {
        let segment = location.rsplit('/').next().unwrap_or(location);
        if segment.is_empty() || segment.trim() != segment {
            return None;
        }
        Some(Self(segment.to_string()))
    }

    /// Borrow the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntryUuid {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or_else(|| "entry uuid must not be empty".to_string())
    }
}

impl From<EntryUuid> for String {
    fn from(value: EntryUuid) -> Self {
        value.0
    }
}

/// OIDC bearer token. The backing memory is zeroed on drop and the value
/// is redacted from `Debug` output.
#[derive(Clone)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    /// Wrap a token string. Returns `None` for an empty token.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(Zeroizing::new(raw)))
        }
    }

    /// Borrow the raw token for an `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}
