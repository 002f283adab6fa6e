//! Name-indexed dataset registry and declarative catalog configuration.
//!
//! The [`DataCatalog`] maps logical dataset names to [`Dataset`] instances
//! and is the single surface runners use to move data in and out of nodes.
//! It can be assembled programmatically (`add`, `add_feed`) or from
//! declarative configuration (`from_config`), which resolves parameter
//! templates and credential references while constructing each backend.

use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};

use common::{DatasetName, VersionToken};
use datasets::{Dataset, DatasetError, MemoryDataset};
use serde_json::Value;

pub mod config;
pub mod error;
pub mod registry;

pub use config::{CatalogConfig, Credentials, DatasetConfig, Parameters, load_catalog_config};
pub use error::CatalogConfigError;
pub use registry::{DatasetContext, DatasetFactory, DatasetRegistry};

use config::expand_template;

/// Construction-time context for [`DataCatalog::from_config`].
pub struct CatalogContext {
    /// Named credential sets referenced by catalog entries.
    pub credentials: Credentials,
    /// Parameters substituted into `${key}` location templates.
    pub parameters: Parameters,
    /// Base directory for relative filesystem locations.
    pub base_path: Option<PathBuf>,
    /// Save version injected into every versioned dataset, so all saves of
    /// one run share a single token.
    pub save_version: Option<VersionToken>,
    /// The kind registry to resolve entries against.
    pub registry: DatasetRegistry,
}

impl Default for CatalogContext {
    fn default() -> Self {
        CatalogContext {
            credentials: Credentials::new(),
            parameters: Parameters::new(),
            base_path: None,
            save_version: None,
            registry: DatasetRegistry::with_defaults(),
        }
    }
}

/// Registry mapping logical dataset names to dataset instances.
///
/// The catalog is read-mostly: it is assembled once per run and then shared
/// by concurrent readers. Operations clone the dataset handle out of the
/// map before any I/O, so the interior lock is never held across an await.
#[derive(Default)]
pub struct DataCatalog {
    datasets: RwLock<BTreeMap<DatasetName, Arc<dyn Dataset>>>,
}

impl std::fmt::Debug for DataCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCatalog").finish_non_exhaustive()
    }
}

impl DataCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a catalog from declarative configuration.
    ///
    /// Fails fast with a descriptive error on the first entry whose kind is
    /// unknown, whose location template references a missing parameter, or
    /// whose credentials reference names no entry.
    pub fn from_config(
        config: &CatalogConfig,
        context: &CatalogContext,
    ) -> Result<Self, CatalogConfigError> {
        let catalog = DataCatalog::new();

        for (raw_name, entry) in config {
            let name: DatasetName =
                raw_name
                    .parse()
                    .map_err(|source| CatalogConfigError::InvalidName {
                        name: raw_name.clone(),
                        source,
                    })?;

            let location = entry
                .location
                .as_deref()
                .map(|template| expand_template(raw_name, template, &context.parameters))
                .transpose()?;

            let credentials = entry
                .credentials
                .as_deref()
                .map(|reference| {
                    context.credentials.get(reference).ok_or_else(|| {
                        CatalogConfigError::MissingCredentials {
                            name: raw_name.clone(),
                            reference: reference.to_string(),
                        }
                    })
                })
                .transpose()?;

            let factory =
                context
                    .registry
                    .get(&entry.kind)
                    .ok_or_else(|| CatalogConfigError::UnknownKind {
                        name: raw_name.clone(),
                        kind: entry.kind.clone(),
                    })?;

            let dataset = (factory.as_ref())(&DatasetContext {
                name: &name,
                config: entry,
                location: location.as_deref(),
                credentials,
                base_path: context.base_path.as_deref(),
                save_version: context.save_version.as_ref(),
            })?;

            tracing::debug!(dataset = %name, kind = %entry.kind, "registered dataset");
            catalog.add(name, dataset)?;
        }

        Ok(catalog)
    }

    /// Registers a dataset under `name`, rejecting duplicates.
    pub fn add(
        &self,
        name: DatasetName,
        dataset: Arc<dyn Dataset>,
    ) -> Result<(), CatalogConfigError> {
        let mut datasets = self.write_guard();
        if datasets.contains_key(name.as_str()) {
            return Err(CatalogConfigError::AlreadyRegistered {
                name: name.to_string(),
            });
        }
        datasets.insert(name, dataset);
        Ok(())
    }

    /// Feeds ad-hoc in-memory values into the catalog.
    ///
    /// Entries replace any dataset already registered under the same name:
    /// a value supplied directly by the caller wins over configuration.
    pub fn add_feed(
        &self,
        feed: impl IntoIterator<Item = (impl AsRef<str>, Value)>,
    ) -> Result<(), CatalogConfigError> {
        for (raw_name, value) in feed {
            let raw_name = raw_name.as_ref();
            let name: DatasetName =
                raw_name
                    .parse()
                    .map_err(|source| CatalogConfigError::InvalidName {
                        name: raw_name.to_string(),
                        source,
                    })?;
            let dataset = Arc::new(MemoryDataset::with_value(name.clone(), value));
            self.write_guard().insert(name, dataset);
        }
        Ok(())
    }

    /// Loads the data registered under `name`.
    pub async fn load(&self, name: &str) -> Result<Value, DatasetError> {
        let dataset = self.get(name).ok_or_else(|| DatasetError::NotInCatalog {
            name: name.to_string(),
        })?;
        tracing::debug!(dataset = name, "loading dataset");
        dataset.load().await
    }

    /// Saves `data` to the dataset registered under `name`.
    pub async fn save(&self, name: &str, data: &Value) -> Result<(), DatasetError> {
        let dataset = self.get(name).ok_or_else(|| DatasetError::NotInCatalog {
            name: name.to_string(),
        })?;
        tracing::debug!(dataset = name, "saving dataset");
        dataset.save(data).await
    }

    /// Whether the dataset registered under `name` currently holds data.
    pub async fn exists(&self, name: &str) -> Result<bool, DatasetError> {
        let dataset = self.get(name).ok_or_else(|| DatasetError::NotInCatalog {
            name: name.to_string(),
        })?;
        dataset.exists().await
    }

    /// Releases any in-process cache held by the dataset under `name`.
    pub fn release(&self, name: &str) -> Result<(), DatasetError> {
        let dataset = self.get(name).ok_or_else(|| DatasetError::NotInCatalog {
            name: name.to_string(),
        })?;
        tracing::debug!(dataset = name, "releasing dataset");
        dataset.release();
        Ok(())
    }

    /// The dataset handle registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Dataset>> {
        self.read_guard().get(name).cloned()
    }

    /// Whether `name` is registered at all.
    pub fn contains(&self, name: &str) -> bool {
        self.read_guard().contains_key(name)
    }

    /// All registered dataset names.
    pub fn list(&self) -> Vec<DatasetName> {
        self.read_guard().keys().cloned().collect()
    }

    fn read_guard(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, BTreeMap<DatasetName, Arc<dyn Dataset>>> {
        self.datasets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, BTreeMap<DatasetName, Arc<dyn Dataset>>> {
        self.datasets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
