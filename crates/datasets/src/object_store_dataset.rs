//! Dataset backend over any object store.
//!
//! One backend type covers local files, S3, and Azure blobs alike: the
//! store abstracts the provider, the injected codec handles the bytes, and
//! the optional [`VersionedPath`] strategy handles snapshot layout.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use common::DatasetName;
use object_store::{ObjectStore, PutPayload, path::Path};
use serde_json::Value;
use weir_object_store::ext::ObjectStoreExt as _;

use crate::{
    Dataset, DatasetError,
    error::CodecOperation,
    format::{DataFormat, FormatArgs},
    reject_null,
    version::{Version, VersionedPath},
};

pub struct ObjectStoreDataset {
    name: DatasetName,
    store: Arc<dyn ObjectStore>,
    store_url: String,
    location: String,
    format: Arc<dyn DataFormat>,
    versioned: Option<VersionedPath>,
    load_args: FormatArgs,
    save_args: FormatArgs,
}

impl ObjectStoreDataset {
    /// Creates an unversioned dataset at `location` within `store`.
    ///
    /// `store_url` is the store's address, kept for `describe()` output
    /// only; `location` is the artifact path relative to the store.
    pub fn new(
        name: DatasetName,
        store: Arc<dyn ObjectStore>,
        store_url: impl Into<String>,
        location: impl Into<String>,
        format: Arc<dyn DataFormat>,
    ) -> Self {
        ObjectStoreDataset {
            name,
            store,
            store_url: store_url.into(),
            location: location.into(),
            format,
            versioned: None,
            load_args: FormatArgs::new(),
            save_args: FormatArgs::new(),
        }
    }

    /// Enables snapshot versioning with the given requested versions.
    pub fn with_version(mut self, version: Version) -> Self {
        self.versioned = Some(VersionedPath::new(self.location.clone(), version));
        self
    }

    pub fn with_load_args(mut self, load_args: FormatArgs) -> Self {
        self.load_args = load_args;
        self
    }

    pub fn with_save_args(mut self, save_args: FormatArgs) -> Self {
        self.save_args = save_args;
        self
    }

    async fn load_path(&self) -> Result<Path, DatasetError> {
        match &self.versioned {
            Some(versioned) => versioned.resolve_load(self.store.as_ref(), &self.name).await,
            None => Ok(Path::from(self.location.as_str())),
        }
    }

    fn save_path(&self) -> Path {
        match &self.versioned {
            Some(versioned) => versioned.resolve_save(),
            None => Path::from(self.location.as_str()),
        }
    }

    async fn read_bytes(&self, path: &Path) -> Result<Bytes, DatasetError> {
        self.store.get_bytes(path.clone()).await.map_err(|err| {
            if err.is_not_found() {
                DatasetError::MissingData {
                    name: self.name.clone(),
                }
            } else {
                DatasetError::Storage {
                    name: self.name.clone(),
                    source: err.into_source(),
                }
            }
        })
    }
}

#[async_trait]
impl Dataset for ObjectStoreDataset {
    fn name(&self) -> &DatasetName {
        &self.name
    }

    async fn load(&self) -> Result<Value, DatasetError> {
        let path = self.load_path().await?;
        let bytes = self.read_bytes(&path).await?;

        tracing::debug!(dataset = %self.name, %path, "loaded dataset");

        self.format
            .decode(bytes, &self.load_args)
            .map_err(|source| DatasetError::Codec {
                name: self.name.clone(),
                format: self.format.name(),
                operation: CodecOperation::Decode,
                source,
            })
    }

    async fn save(&self, data: &Value) -> Result<(), DatasetError> {
        reject_null(&self.name, data)?;

        let bytes = self
            .format
            .encode(data, &self.save_args)
            .map_err(|source| DatasetError::Codec {
                name: self.name.clone(),
                format: self.format.name(),
                operation: CodecOperation::Encode,
                source,
            })?;

        let path = self.save_path();
        self.store
            .put(&path, PutPayload::from(bytes))
            .await
            .map_err(|source| DatasetError::Storage {
                name: self.name.clone(),
                source,
            })?;

        tracing::debug!(dataset = %self.name, %path, "saved dataset");

        // A load issued after this save must resolve back to the exact path
        // just written.
        if let Some(versioned) = &self.versioned {
            versioned
                .check_save_consistency(self.store.as_ref(), &self.name, &path)
                .await?;
        }

        Ok(())
    }

    async fn exists(&self) -> Result<bool, DatasetError> {
        let path = match self.load_path().await {
            Ok(path) => path,
            Err(err) if err.is_missing() => return Ok(false),
            Err(err) => return Err(err),
        };

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(source) => Err(DatasetError::Storage {
                name: self.name.clone(),
                source,
            }),
        }
    }

    fn describe(&self) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::from([
            (
                "filepath".to_string(),
                format!("{}/{}", self.store_url.trim_end_matches('/'), self.location),
            ),
            ("format".to_string(), self.format.name().to_string()),
            (
                "versioned".to_string(),
                self.versioned.is_some().to_string(),
            ),
        ]);
        if let Some(versioned) = &self.versioned {
            attrs.insert(
                "save_version".to_string(),
                versioned.save_token().to_string(),
            );
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use common::VersionToken;
    use serde_json::json;

    use super::*;
    use crate::JsonFormat;

    fn dataset(store: Arc<dyn ObjectStore>) -> ObjectStoreDataset {
        ObjectStoreDataset::new(
            "cars".parse().unwrap(),
            store,
            "memory://test/",
            "cars.json",
            Arc::new(JsonFormat),
        )
    }

    #[tokio::test]
    async fn unversioned_round_trip() {
        let store = weir_object_store::in_memory();
        let cars = dataset(store);
        let data = json!({"col1": [1, 2], "col2": [4, 5]});

        cars.save(&data).await.unwrap();
        assert!(cars.exists().await.unwrap());
        assert_eq!(cars.load().await.unwrap(), data);
    }

    #[tokio::test]
    async fn versioned_round_trip_resolves_just_saved_version() {
        let store = weir_object_store::in_memory();
        let cars = dataset(store.clone()).with_version(Version::default());
        let data = json!([1, 2, 3]);

        cars.save(&data).await.unwrap();

        // A fresh instance with no pinned version must see the same data.
        let reloaded = dataset(store).with_version(Version::default());
        assert_eq!(reloaded.load().await.unwrap(), data);
    }

    #[tokio::test]
    async fn saves_within_a_run_share_one_token() {
        let store = weir_object_store::in_memory();
        let cars = dataset(store.clone()).with_version(Version::default());

        cars.save(&json!(1)).await.unwrap();
        cars.save(&json!(2)).await.unwrap();

        let listing = store
            .list_with_delimiter(Some(&Path::from("cars.json")))
            .await
            .unwrap();
        assert_eq!(listing.common_prefixes.len(), 1);
    }

    #[tokio::test]
    async fn later_run_produces_greater_token_and_wins_resolution() {
        let store = weir_object_store::in_memory();

        let older: VersionToken = "2026-08-07T10.00.00.000000Z".parse().unwrap();
        let newer: VersionToken = "2026-08-07T11.00.00.000000Z".parse().unwrap();

        let first_run = dataset(store.clone()).with_version(Version::new(None, Some(older)));
        first_run.save(&json!("first")).await.unwrap();

        let second_run = dataset(store.clone()).with_version(Version::new(None, Some(newer)));
        second_run.save(&json!("second")).await.unwrap();

        let reader = dataset(store).with_version(Version::default());
        assert_eq!(reader.load().await.unwrap(), json!("second"));
    }

    #[tokio::test]
    async fn missing_artifact_is_missing_not_an_io_fault() {
        let store = weir_object_store::in_memory();
        let cars = dataset(store);

        assert!(!cars.exists().await.unwrap());
        let result = cars.load().await;
        assert!(matches!(result, Err(DatasetError::MissingData { .. })));
    }

    #[tokio::test]
    async fn null_save_is_rejected() {
        let store = weir_object_store::in_memory();
        let cars = dataset(store);

        let result = cars.save(&Value::Null).await;
        assert!(matches!(result, Err(DatasetError::NullData { .. })));
    }

    #[tokio::test]
    async fn stale_pinned_load_version_fails_consistency_on_save() {
        let store = weir_object_store::in_memory();

        let pinned: VersionToken = "2026-08-07T10.00.00.000000Z".parse().unwrap();
        let seeded = dataset(store.clone())
            .with_version(Version::new(None, Some(pinned.clone())));
        seeded.save(&json!("old")).await.unwrap();

        let skewed = dataset(store).with_version(Version::new(Some(pinned), None));
        let result = skewed.save(&json!("new")).await;

        assert!(matches!(
            result,
            Err(DatasetError::PathConsistency { .. })
        ));
    }

    #[tokio::test]
    async fn describe_reports_location_and_format() {
        let store = weir_object_store::in_memory();
        let cars = dataset(store);

        let attrs = cars.describe();
        assert_eq!(attrs.get("filepath").unwrap(), "memory://test/cars.json");
        assert_eq!(attrs.get("format").unwrap(), "json");
        assert_eq!(attrs.get("versioned").unwrap(), "false");
    }
}
