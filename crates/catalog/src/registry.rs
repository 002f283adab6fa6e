//! Explicit dataset-kind registry.
//!
//! Kinds are registered up front through this API rather than discovered at
//! runtime. A failing registration is logged and skipped, so one broken
//! registration cannot block the process.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use common::{DatasetName, VersionToken};
use datasets::{
    DataFormat, Dataset, JsonFormat, MemoryDataset, ObjectStoreDataset, TextFormat, Version,
};
use weir_object_store::StoreCredentials;

use crate::{CatalogConfigError, config::DatasetConfig};

/// Everything a factory needs to construct one dataset.
///
/// `location` is the catalog entry's location with parameter templates
/// already expanded; `credentials` is the resolved credential set the entry
/// referenced.
pub struct DatasetContext<'a> {
    pub name: &'a DatasetName,
    pub config: &'a DatasetConfig,
    pub location: Option<&'a str>,
    pub credentials: Option<&'a StoreCredentials>,
    pub base_path: Option<&'a Path>,
    pub save_version: Option<&'a VersionToken>,
}

/// Constructs a dataset from its catalog entry.
pub type DatasetFactory =
    Arc<dyn Fn(&DatasetContext<'_>) -> Result<Arc<dyn Dataset>, CatalogConfigError> + Send + Sync>;

/// Table of dataset kinds the catalog can construct.
#[derive(Clone, Default)]
pub struct DatasetRegistry {
    factories: BTreeMap<String, DatasetFactory>,
}

impl DatasetRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in kinds: `json`, `text`, and `memory`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_all([
            ("json".to_string(), json_factory()),
            ("text".to_string(), text_factory()),
            ("memory".to_string(), memory_factory()),
        ]);
        registry
    }

    /// Registers a factory for `kind`, failing if the kind already exists.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        factory: DatasetFactory,
    ) -> Result<(), CatalogConfigError> {
        let kind = kind.into();
        if self.factories.contains_key(&kind) {
            return Err(CatalogConfigError::DuplicateKind { kind });
        }
        self.factories.insert(kind, factory);
        Ok(())
    }

    /// Registers a batch of factories, logging and skipping failures.
    pub fn register_all(
        &mut self,
        factories: impl IntoIterator<Item = (String, DatasetFactory)>,
    ) {
        for (kind, factory) in factories {
            if let Err(err) = self.register(kind.clone(), factory) {
                tracing::warn!(kind = %kind, error = %err, "skipping dataset kind registration");
            }
        }
    }

    pub fn get(&self, kind: &str) -> Option<&DatasetFactory> {
        self.factories.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for DatasetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn memory_factory() -> DatasetFactory {
    Arc::new(|ctx: &DatasetContext<'_>| {
        let dataset: Arc<dyn Dataset> = Arc::new(MemoryDataset::new(ctx.name.clone()));
        Ok(dataset)
    })
}

fn json_factory() -> DatasetFactory {
    Arc::new(|ctx: &DatasetContext<'_>| build_object_store_dataset(ctx, Arc::new(JsonFormat)))
}

fn text_factory() -> DatasetFactory {
    Arc::new(|ctx: &DatasetContext<'_>| build_object_store_dataset(ctx, Arc::new(TextFormat)))
}

/// Shared construction for storage-backed kinds.
fn build_object_store_dataset(
    ctx: &DatasetContext<'_>,
    format: Arc<dyn DataFormat>,
) -> Result<Arc<dyn Dataset>, CatalogConfigError> {
    let location = ctx
        .location
        .ok_or_else(|| CatalogConfigError::MissingLocation {
            name: ctx.name.to_string(),
        })?;

    // The final path segment is the artifact; the rest addresses the store.
    let (dir, filename) = match location.rsplit_once('/') {
        Some((dir, filename)) => (dir, filename),
        None => (".", location),
    };
    if filename.is_empty() {
        return Err(CatalogConfigError::MissingLocation {
            name: ctx.name.to_string(),
        });
    }

    let url = weir_object_store::url::ObjectStoreUrl::new_with_base(dir, ctx.base_path).map_err(
        |source| CatalogConfigError::InvalidLocation {
            name: ctx.name.to_string(),
            source,
        },
    )?;

    let store = weir_object_store::new_with_prefix(&url, url.prefix(), ctx.credentials).map_err(
        |source| CatalogConfigError::StoreCreation {
            name: ctx.name.to_string(),
            source,
        },
    )?;

    let mut dataset = ObjectStoreDataset::new(
        ctx.name.clone(),
        store,
        url.to_string(),
        filename,
        format,
    )
    .with_load_args(ctx.config.load_args.clone())
    .with_save_args(ctx.config.save_args.clone());

    if ctx.config.versioned {
        dataset = dataset.with_version(Version::new(
            ctx.config.load_version.clone(),
            ctx.save_version.cloned(),
        ));
    }

    Ok(Arc::new(dataset))
}
