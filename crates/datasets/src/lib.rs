//! Dataset contract, storage backends, and snapshot versioning for weir.
//!
//! A [`Dataset`] is the uniform wrapper around one named data artifact:
//! whatever the storage backend, it can be loaded, saved, checked for
//! existence, and described. Versioned datasets additionally write every
//! save as an immutable timestamped snapshot and resolve loads to the
//! latest snapshot present on storage.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

pub mod error;
pub mod format;
pub mod memory;
pub mod object_store_dataset;
pub mod version;

pub use error::DatasetError;
pub use format::{DataFormat, FormatArgs, FormatError, JsonFormat, TextFormat};
pub use memory::MemoryDataset;
pub use object_store_dataset::ObjectStoreDataset;
pub use version::{Version, VersionedPath};

/// The uniform capability contract every storage backend implements.
///
/// Implementations confine their side effects to the one external resource
/// they name; no dataset touches another dataset's resource. `load` and
/// `save` are safe to call from concurrent readers; the pipeline graph
/// guarantees a single writer per name.
#[async_trait]
pub trait Dataset: Send + Sync {
    /// The catalog name this dataset is registered under.
    fn name(&self) -> &common::DatasetName;

    /// Loads the artifact from the backing resource.
    async fn load(&self) -> Result<Value, DatasetError>;

    /// Saves `data` to the backing resource.
    async fn save(&self, data: &Value) -> Result<(), DatasetError>;

    /// Whether the backing resource currently holds data.
    async fn exists(&self) -> Result<bool, DatasetError>;

    /// Introspection attributes for logging. Never includes secrets.
    fn describe(&self) -> BTreeMap<String, String>;

    /// Drops any in-process cache of the data. No-op for persistent backends.
    fn release(&self) {}
}

/// Saving `null` is not allowed, for any backend.
pub(crate) fn reject_null(name: &common::DatasetName, data: &Value) -> Result<(), DatasetError> {
    if data.is_null() {
        return Err(DatasetError::NullData { name: name.clone() });
    }
    Ok(())
}
