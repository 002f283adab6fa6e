//! Dataset name validation and types.

/// A validated dataset name.
///
/// Dataset names are the keys of the data catalog and the edges of the
/// pipeline graph, so they must be stable identifiers that survive file
/// systems, object store paths, and log lines.
///
/// A valid dataset name must:
/// - **Start** with a letter (`a-z`, `A-Z`) or underscore (`_`)
/// - **Contain** only letters, digits, underscores, and dots
///   (`.` separates namespace segments, e.g. `ingest.cars`)
/// - **Not be empty**
///
/// Colons are rejected: the name grammar is colon-free.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DatasetName(String);

impl DatasetName {
    /// Returns a reference to the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name and returns the inner String.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the namespace prefix of the name, if it has one.
    ///
    /// For `ingest.cars` this is `Some("ingest")`; for `cars` it is `None`.
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(ns, _)| ns)
    }
}

impl PartialEq<str> for DatasetName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<DatasetName> for str {
    fn eq(&self, other: &DatasetName) -> bool {
        *self == other.0
    }
}

impl PartialEq<&str> for DatasetName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == **other
    }
}

impl PartialEq<String> for DatasetName {
    fn eq(&self, other: &String) -> bool {
        self.0 == *other
    }
}

impl AsRef<str> for DatasetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for DatasetName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for DatasetName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<String> for DatasetName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_dataset_name(&value)?;
        Ok(DatasetName(value))
    }
}

impl std::str::FromStr for DatasetName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_dataset_name(s)?;
        Ok(DatasetName(s.to_string()))
    }
}

impl std::fmt::Display for DatasetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl serde::Serialize for DatasetName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for DatasetName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.try_into().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when validating a dataset name.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NameError {
    /// The name is empty.
    #[error("dataset name cannot be empty")]
    Empty,

    /// The name starts with an invalid character.
    #[error("dataset name must start with a letter or underscore, got '{0}'")]
    InvalidStart(char),

    /// The name contains an invalid character.
    #[error("dataset name contains invalid character '{0}'")]
    InvalidChar(char),
}

fn validate_dataset_name(name: &str) -> Result<(), NameError> {
    let mut chars = name.chars();

    let first = chars.next().ok_or(NameError::Empty)?;
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(NameError::InvalidStart(first));
    }

    for c in chars {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '.' {
            return Err(NameError::InvalidChar(c));
        }
    }

    Ok(())
}
