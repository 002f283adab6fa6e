//! The dataset error taxonomy.

use common::DatasetName;
use object_store::path::Path;

use crate::format::FormatError;

/// Errors raised by dataset operations and catalog lookups.
///
/// Every variant carries the dataset name (and version path where relevant)
/// so a failure can be located without re-running with extra diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The name is not registered in the catalog.
    ///
    /// Carries the raw requested name, which may not even be a valid
    /// dataset name.
    #[error("dataset '{name}' is not registered in the catalog")]
    NotInCatalog { name: String },

    /// The backing resource holds no data yet.
    #[error("no data has been saved yet for dataset '{name}'")]
    MissingData { name: DatasetName },

    /// Backend I/O failure.
    #[error("storage operation failed for dataset '{name}'")]
    Storage {
        name: DatasetName,
        #[source]
        source: object_store::Error,
    },

    /// The artifact bytes could not be encoded or decoded.
    #[error("failed to {operation} dataset '{name}' as {format}")]
    Codec {
        name: DatasetName,
        format: &'static str,
        operation: CodecOperation,
        #[source]
        source: FormatError,
    },

    /// A versioned load found no snapshots at the location.
    #[error("no versions found for dataset '{name}' at '{location}'")]
    NoVersions { name: DatasetName, location: Path },

    /// The path just saved to does not match the path a load would resolve.
    ///
    /// This indicates a correctness hazard in versioned lineage (clock skew
    /// or listing lag) and is always fatal.
    #[error(
        "version consistency failure for dataset '{name}': \
         save path '{save_path}' does not match load path '{load_path}'"
    )]
    PathConsistency {
        name: DatasetName,
        save_path: Path,
        load_path: Path,
    },

    /// Saving a JSON `null` value.
    #[error("saving 'null' to dataset '{name}' is not allowed")]
    NullData { name: DatasetName },
}

impl DatasetError {
    /// Whether the failure is an absent resource rather than a fault.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            DatasetError::MissingData { .. }
                | DatasetError::NoVersions { .. }
                | DatasetError::NotInCatalog { .. }
        )
    }
}

/// Which half of a codec failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOperation {
    Encode,
    Decode,
}

impl std::fmt::Display for CodecOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecOperation::Encode => "encode",
            CodecOperation::Decode => "decode",
        }
        .fmt(f)
    }
}
