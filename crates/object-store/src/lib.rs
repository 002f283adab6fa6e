//! Object store construction for weir storage backends.
//!
//! This crate provides a unified way to build `object_store` instances for
//! the storage backends weir datasets live on: local filesystem, Amazon S3,
//! Azure Blob Storage, and Google Cloud Storage.

use std::{collections::BTreeMap, sync::Arc};

use object_store::{
    ObjectStore, aws::AmazonS3Builder, azure::MicrosoftAzureBuilder,
    gcp::GoogleCloudStorageBuilder, local::LocalFileSystem, path::Path, prefix::PrefixStore,
};

pub mod ext;
pub mod url;

use self::url::{ObjectStoreProvider, ObjectStoreUrl};

/// Credential key/value pairs for one storage backend.
///
/// Keys use the provider's configuration names (e.g. `aws_access_key_id`,
/// `azure_storage_account_key`) and are applied on top of whatever the
/// environment provides.
pub type StoreCredentials = BTreeMap<String, String>;

/// Creates a path-scoped object store where operations are relative to the
/// given prefix.
///
/// Cloud providers are configured from `AWS_*` / `AZURE_*` / `GOOGLE_*`
/// environment variables first; entries in `credentials` override them, so a
/// catalog can point two datasets at the same provider with different
/// accounts.
pub fn new_with_prefix(
    url: impl AsRef<ObjectStoreUrl>,
    prefix: impl Into<Path>,
    credentials: Option<&StoreCredentials>,
) -> Result<Arc<dyn ObjectStore>, ObjectStoreCreationError> {
    let url = url.as_ref();

    let store: Box<dyn ObjectStore> = match url.provider() {
        ObjectStoreProvider::AmazonS3 => {
            let mut builder = AmazonS3Builder::from_env().with_url(url.as_str());
            for (key, value) in credentials.into_iter().flatten() {
                let key = key.parse().map_err(|err| {
                    ObjectStoreCreationError::UnknownCredentialKey {
                        key: key.clone(),
                        url: url.to_string(),
                        source: err,
                    }
                })?;
                builder = builder.with_config(key, value);
            }
            Box::new(builder.build().map_err(|err| creation_error(url, err))?)
        }
        ObjectStoreProvider::MicrosoftAzure => {
            let mut builder = MicrosoftAzureBuilder::from_env().with_url(url.as_str());
            for (key, value) in credentials.into_iter().flatten() {
                let key = key.parse().map_err(|err| {
                    ObjectStoreCreationError::UnknownCredentialKey {
                        key: key.clone(),
                        url: url.to_string(),
                        source: err,
                    }
                })?;
                builder = builder.with_config(key, value);
            }
            Box::new(builder.build().map_err(|err| creation_error(url, err))?)
        }
        ObjectStoreProvider::GoogleCloudStorage => {
            let mut builder = GoogleCloudStorageBuilder::from_env().with_url(url.as_str());
            for (key, value) in credentials.into_iter().flatten() {
                let key = key.parse().map_err(|err| {
                    ObjectStoreCreationError::UnknownCredentialKey {
                        key: key.clone(),
                        url: url.to_string(),
                        source: err,
                    }
                })?;
                builder = builder.with_config(key, value);
            }
            Box::new(builder.build().map_err(|err| creation_error(url, err))?)
        }
        ObjectStoreProvider::Local => Box::new(LocalFileSystem::new()),
    };

    Ok(Arc::new(PrefixStore::new(store, prefix)))
}

/// Creates a store backed by process-local memory.
///
/// Contents vanish with the process; useful for tests and ad-hoc runs.
pub fn in_memory() -> Arc<dyn ObjectStore> {
    Arc::new(object_store::memory::InMemory::new())
}

fn creation_error(url: &ObjectStoreUrl, source: object_store::Error) -> ObjectStoreCreationError {
    ObjectStoreCreationError::Provider {
        url: url.to_string(),
        source,
    }
}

/// Failed to create an object store instance.
///
/// The URL itself has already been validated; these errors come from the
/// provider initialization, typically missing or malformed credentials.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreCreationError {
    /// The underlying provider could not be initialized.
    #[error("failed to create object store for {url}")]
    Provider {
        url: String,
        #[source]
        source: object_store::Error,
    },

    /// A credentials entry used a key the provider does not understand.
    #[error("unknown credential key '{key}' for object store {url}")]
    UnknownCredentialKey {
        key: String,
        url: String,
        #[source]
        source: object_store::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_store_scopes_operations_to_prefix() {
        //* Given
        let dir = tempfile::tempdir().unwrap();
        let url = ObjectStoreUrl::new(dir.path().display().to_string()).unwrap();

        //* When
        let store = new_with_prefix(&url, url.prefix(), None).unwrap();
        store
            .put(&Path::from("inner/file.json"), "{}".into())
            .await
            .unwrap();

        //* Then
        assert!(dir.path().join("inner/file.json").exists());
    }

    #[test]
    fn unknown_credential_key_is_rejected() {
        let url: ObjectStoreUrl = "s3://bucket/data".parse().unwrap();
        let credentials =
            StoreCredentials::from([("not_a_real_key".to_string(), "value".to_string())]);

        let result = new_with_prefix(&url, url.prefix(), Some(&credentials));
        assert!(matches!(
            result,
            Err(ObjectStoreCreationError::UnknownCredentialKey { ref key, .. }) if key == "not_a_real_key"
        ));
    }
}
