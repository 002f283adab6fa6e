//! Validated URL wrapper and provider types for object store URLs.

use std::path::PathBuf;

use fs_err as fs;
use url::Url;

/// A validated URL wrapper that ensures the URL is a valid object store URL.
#[derive(Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ObjectStoreUrl(Url);

impl ObjectStoreUrl {
    /// Creates a new `ObjectStoreUrl` from a string that can be either a URL
    /// or a filesystem path.
    pub fn new(location: impl Into<String>) -> Result<Self, ObjectStoreUrlError> {
        Self::new_with_base(location, None)
    }

    /// Creates a new [`ObjectStoreUrl`] from a string that can be either a
    /// URL or a filesystem path.
    ///
    /// If `location` is a relative filesystem path, then `base` will be used
    /// as the prefix.
    pub fn new_with_base(
        location: impl Into<String>,
        base: Option<&std::path::Path>,
    ) -> Result<Self, ObjectStoreUrlError> {
        let location = location.into();

        // If the location fails to parse as a URL, we assume it's a filesystem path.
        Self::try_from_url(&location).or_else(|_| Self::try_from_filesystem_path(&location, base))
    }

    /// Parses a string as a URL and validates it for object store use.
    ///
    /// The URL must have a supported object store scheme (`file://`, `s3://`,
    /// `az://`, `gs://`, etc.).
    fn try_from_url(url: impl AsRef<str>) -> Result<Self, ObjectStoreUrlError> {
        let inner = Url::parse(url.as_ref()).map_err(ObjectStoreUrlError::UrlParseError)?;

        // Validate the scheme to ensure it's a supported object store scheme
        let _: ObjectStoreProvider = inner.scheme().parse()?;

        Ok(Self(inner))
    }

    /// Parses a string as a filesystem path and converts it to a `file://` URL.
    ///
    /// If the path is relative, `base` will be used as the prefix, otherwise
    /// `base` is ignored.
    ///
    /// The path must exist and must be canonicalized to an absolute path.
    fn try_from_filesystem_path(
        location: impl AsRef<str>,
        base: Option<&std::path::Path>,
    ) -> Result<Self, ObjectStoreUrlError> {
        let mut path = PathBuf::from(location.as_ref());
        if !path.is_absolute()
            && let Some(base) = base
        {
            path = PathBuf::from(base).join(path);
        }

        let canonical_path = fs::canonicalize(&path)
            .map_err(|err| ObjectStoreUrlError::InvalidFilesystemPath { path, source: err })?;

        let url = Url::from_directory_path(&canonical_path).map_err(|_| {
            ObjectStoreUrlError::InvalidFilesystemPath {
                path: canonical_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "absolute path could not be resolved",
                ),
            }
        })?;

        Ok(Self(url))
    }

    /// Consumes self and returns the inner [`Url`].
    pub fn into_url(self) -> Url {
        self.0
    }

    /// Returns the [`ObjectStoreProvider`] of the URL.
    pub fn provider(&self) -> ObjectStoreProvider {
        match self.0.scheme() {
            s if ObjectStoreProvider::is_local_filesystem(s) => ObjectStoreProvider::Local,
            s if ObjectStoreProvider::is_amazon_s3(s) => ObjectStoreProvider::AmazonS3,
            s if ObjectStoreProvider::is_google_cloud_storage(s) => {
                ObjectStoreProvider::GoogleCloudStorage
            }
            s if ObjectStoreProvider::is_microsoft_azure(s) => ObjectStoreProvider::MicrosoftAzure,
            _ => unreachable!(), // We validate the scheme previously.
        }
    }

    /// Returns the URL path as an object store path prefix.
    ///
    /// The bucket/container root is addressed by the store itself, so the
    /// prefix is the path component with the leading slash stripped. For
    /// `file://` URLs the whole filesystem path becomes the prefix, since
    /// local stores are rooted at `/`.
    pub fn prefix(&self) -> String {
        self.0.path().trim_matches('/').to_string()
    }
}

impl AsRef<ObjectStoreUrl> for ObjectStoreUrl {
    fn as_ref(&self) -> &ObjectStoreUrl {
        self
    }
}

impl std::ops::Deref for ObjectStoreUrl {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<Url> for ObjectStoreUrl {
    type Error = ObjectStoreUrlError;

    fn try_from(value: Url) -> Result<Self, Self::Error> {
        Self::try_from_url(value)
    }
}

impl std::str::FromStr for ObjectStoreUrl {
    type Err = ObjectStoreUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Url::parse(s)
            .map_err(ObjectStoreUrlError::UrlParseError)?
            .try_into()
    }
}

impl std::fmt::Display for ObjectStoreUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for ObjectStoreUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl From<&ObjectStoreUrl> for String {
    fn from(value: &ObjectStoreUrl) -> Self {
        value.0.to_string()
    }
}

/// The storage provider addressed by an [`ObjectStoreUrl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectStoreProvider {
    /// Local filesystem (`file://`).
    Local,
    /// Amazon S3 (`s3://`, `s3a://`).
    AmazonS3,
    /// Google Cloud Storage (`gs://`).
    GoogleCloudStorage,
    /// Microsoft Azure Blob Storage (`az://`, `adl://`, `azure://`,
    /// `abfs://`, `abfss://`).
    MicrosoftAzure,
}

impl ObjectStoreProvider {
    fn is_local_filesystem(scheme: &str) -> bool {
        scheme == "file"
    }

    fn is_amazon_s3(scheme: &str) -> bool {
        matches!(scheme, "s3" | "s3a")
    }

    fn is_google_cloud_storage(scheme: &str) -> bool {
        scheme == "gs"
    }

    fn is_microsoft_azure(scheme: &str) -> bool {
        matches!(scheme, "az" | "adl" | "azure" | "abfs" | "abfss")
    }
}

impl std::str::FromStr for ObjectStoreProvider {
    type Err = ObjectStoreUrlError;

    fn from_str(scheme: &str) -> Result<Self, Self::Err> {
        match scheme {
            s if Self::is_local_filesystem(s) => Ok(Self::Local),
            s if Self::is_amazon_s3(s) => Ok(Self::AmazonS3),
            s if Self::is_google_cloud_storage(s) => Ok(Self::GoogleCloudStorage),
            s if Self::is_microsoft_azure(s) => Ok(Self::MicrosoftAzure),
            _ => Err(ObjectStoreUrlError::UnsupportedScheme {
                scheme: scheme.to_string(),
            }),
        }
    }
}

/// Errors that can occur when validating an object store URL.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreUrlError {
    /// The string is not a parseable URL.
    #[error("invalid URL: {0}")]
    UrlParseError(#[source] url::ParseError),

    /// The URL scheme does not name a supported storage provider.
    #[error("unsupported object store scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },

    /// The location is a filesystem path that does not resolve to an
    /// existing directory.
    #[error("invalid filesystem path: {path}")]
    InvalidFilesystemPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
