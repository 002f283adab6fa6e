//! Version tokens for dataset snapshots.

use chrono::Utc;

/// Timestamp format for generated tokens, e.g. `2026-08-07T14.03.22.123456Z`.
///
/// Dots replace the colons of RFC 3339 so tokens are safe as path segments
/// on every supported storage backend. The fixed width keeps lexicographic
/// order identical to chronological order.
const TOKEN_FORMAT: &str = "%Y-%m-%dT%H.%M.%S.%6fZ";

/// An opaque, ordered identifier for one saved snapshot of a dataset.
///
/// All versioned datasets saved within one pipeline run share a single
/// token, which is what makes "which run produced this artifact" queries
/// possible. Tokens generated later compare strictly greater, and a load
/// without an explicit version resolves to the greatest token present on
/// storage.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    /// Generates a fresh token from the current UTC time.
    pub fn generate() -> Self {
        VersionToken(Utc::now().format(TOKEN_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for VersionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for VersionToken {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<String> for VersionToken {
    type Error = VersionTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_token(&value)?;
        Ok(VersionToken(value))
    }
}

impl std::str::FromStr for VersionToken {
    type Err = VersionTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_token(s)?;
        Ok(VersionToken(s.to_string()))
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl serde::Serialize for VersionToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for VersionToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.try_into().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when validating a version token.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VersionTokenError {
    /// The token is empty.
    #[error("version token cannot be empty")]
    Empty,

    /// The token contains a character that cannot appear in a path segment.
    #[error("version token contains invalid character '{0}'")]
    InvalidChar(char),
}

fn validate_token(token: &str) -> Result<(), VersionTokenError> {
    if token.is_empty() {
        return Err(VersionTokenError::Empty);
    }
    // Tokens become single path segments under every backend.
    if let Some(c) = token.chars().find(|c| *c == '/' || c.is_whitespace()) {
        return Err(VersionTokenError::InvalidChar(c));
    }
    Ok(())
}
