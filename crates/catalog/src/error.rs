//! Catalog configuration errors.

use common::NameError;
use weir_object_store::{ObjectStoreCreationError, url::ObjectStoreUrlError};

/// Errors raised while constructing a catalog from declarative
/// configuration.
///
/// All of these fail fast, before any dataset is touched.
#[derive(Debug, thiserror::Error)]
pub enum CatalogConfigError {
    /// The configuration file could not be read or parsed.
    #[error("failed to load catalog configuration")]
    Config(#[from] figment::Error),

    /// A catalog entry uses a name the identifier grammar rejects.
    #[error("invalid dataset name '{name}'")]
    InvalidName {
        name: String,
        #[source]
        source: NameError,
    },

    /// A catalog entry names a dataset kind no factory is registered for.
    #[error("dataset '{name}' has unknown kind '{kind}'")]
    UnknownKind { name: String, kind: String },

    /// A storage-backed dataset entry has no location.
    #[error("dataset '{name}' requires a location")]
    MissingLocation { name: String },

    /// The location is not a valid path or object store URL.
    #[error("dataset '{name}' has an invalid location")]
    InvalidLocation {
        name: String,
        #[source]
        source: ObjectStoreUrlError,
    },

    /// A location template references a parameter that was not supplied.
    #[error("dataset '{name}' references unknown parameter '${{{key}}}'")]
    MissingParameter { name: String, key: String },

    /// A credentials reference names no entry in the credentials mapping.
    #[error("dataset '{name}' references unknown credentials '{reference}'")]
    MissingCredentials { name: String, reference: String },

    /// The storage backend for a dataset could not be initialized.
    #[error("failed to create storage backend for dataset '{name}'")]
    StoreCreation {
        name: String,
        #[source]
        source: ObjectStoreCreationError,
    },

    /// Two catalog entries (or two `add` calls) use the same name.
    #[error("dataset '{name}' is already registered in the catalog")]
    AlreadyRegistered { name: String },

    /// A registry registration clashed with an existing kind.
    #[error("dataset kind '{kind}' is already registered")]
    DuplicateKind { kind: String },
}
