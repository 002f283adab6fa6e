//! In-memory dataset for transient values.

use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use async_trait::async_trait;
use common::DatasetName;
use serde_json::Value;

use crate::{Dataset, DatasetError, reject_null};

/// A dataset held entirely in process memory.
///
/// The catalog auto-binds one of these to every pipeline name that has no
/// registered backend, and callers feed ad-hoc inputs through them. Values
/// are cloned on both load and save, so a node can never observe another
/// node's mutations through shared data.
pub struct MemoryDataset {
    name: DatasetName,
    data: RwLock<Option<Value>>,
}

impl MemoryDataset {
    /// Creates an empty dataset; loading before the first save fails.
    pub fn new(name: DatasetName) -> Self {
        MemoryDataset {
            name,
            data: RwLock::new(None),
        }
    }

    /// Creates a dataset pre-populated with `value`.
    pub fn with_value(name: DatasetName, value: Value) -> Self {
        MemoryDataset {
            name,
            data: RwLock::new(Some(value)),
        }
    }
}

#[async_trait]
impl Dataset for MemoryDataset {
    fn name(&self) -> &DatasetName {
        &self.name
    }

    async fn load(&self) -> Result<Value, DatasetError> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone().ok_or_else(|| DatasetError::MissingData {
            name: self.name.clone(),
        })
    }

    async fn save(&self, data: &Value) -> Result<(), DatasetError> {
        reject_null(&self.name, data)?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(data.clone());
        Ok(())
    }

    async fn exists(&self) -> Result<bool, DatasetError> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.is_some())
    }

    fn describe(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("kind".to_string(), "memory".to_string())])
    }

    fn release(&self) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}
