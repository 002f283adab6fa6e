//! Extension trait for ObjectStore.

use std::future::Future;

use bytes::Bytes;
use object_store::{ObjectStore, path::Path};

/// Convenience reads for any `ObjectStore`.
pub trait ObjectStoreExt {
    /// Reads the entire contents of an object as `Bytes`.
    ///
    /// Combines `ObjectStore::get()` with draining the returned stream.
    fn get_bytes(
        &self,
        location: impl Into<Path>,
    ) -> impl Future<Output = Result<Bytes, ObjectStoreExtError>>;
}

impl<T> ObjectStoreExt for T
where
    T: ObjectStore + ?Sized,
{
    async fn get_bytes(&self, location: impl Into<Path>) -> Result<Bytes, ObjectStoreExtError> {
        self.get(&location.into())
            .await
            .map_err(ObjectStoreExtError::Get)?
            .bytes()
            .await
            .map_err(ObjectStoreExtError::Read)
    }
}

/// Error type for object store read operations.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreExtError {
    /// Error initiating object retrieval.
    #[error("failed to get object: {0}")]
    Get(#[source] object_store::Error),

    /// Error reading object bytes after successful retrieval.
    #[error("failed to read object bytes: {0}")]
    Read(#[source] object_store::Error),
}

impl ObjectStoreExtError {
    /// Whether the failure is the object simply not being there.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ObjectStoreExtError::Get(object_store::Error::NotFound { .. })
                | ObjectStoreExtError::Read(object_store::Error::NotFound { .. })
        )
    }

    /// Unwraps the underlying store error.
    pub fn into_source(self) -> object_store::Error {
        match self {
            ObjectStoreExtError::Get(err) | ObjectStoreExtError::Read(err) => err,
        }
    }
}
