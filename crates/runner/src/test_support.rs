//! Shared fixtures for runner tests.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use async_trait::async_trait;
use common::{BoxResult, DatasetName};
use datasets::{Dataset, DatasetError};
use serde_json::Value;

/// Chronological record of (operation, dataset) events.
pub(crate) type EventLog = Arc<Mutex<Vec<(String, String)>>>;

pub(crate) fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn events(log: &EventLog) -> Vec<(String, String)> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// An in-memory dataset that records loads and releases.
pub(crate) struct TrackedDataset {
    name: DatasetName,
    log: EventLog,
    data: RwLock<Option<Value>>,
}

impl TrackedDataset {
    pub(crate) fn new(log: EventLog, name: &str) -> Self {
        TrackedDataset {
            name: name.parse().unwrap(),
            log,
            data: RwLock::new(None),
        }
    }

    pub(crate) fn with_value(log: EventLog, name: &str, value: Value) -> Self {
        let dataset = Self::new(log, name);
        *dataset.data.write().unwrap() = Some(value);
        dataset
    }

    fn record(&self, operation: &str) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((operation.to_string(), self.name.to_string()));
    }
}

#[async_trait]
impl Dataset for TrackedDataset {
    fn name(&self) -> &DatasetName {
        &self.name
    }

    async fn load(&self) -> Result<Value, DatasetError> {
        self.record("load");
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone().ok_or_else(|| DatasetError::MissingData {
            name: self.name.clone(),
        })
    }

    async fn save(&self, data: &Value) -> Result<(), DatasetError> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(data.clone());
        Ok(())
    }

    async fn exists(&self) -> Result<bool, DatasetError> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.is_some())
    }

    fn describe(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn release(&self) {
        self.record("release");
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

pub(crate) fn identity(inputs: Vec<Value>) -> BoxResult<Vec<Value>> {
    Ok(inputs)
}

pub(crate) fn fan_in(inputs: Vec<Value>) -> BoxResult<Vec<Value>> {
    Ok(vec![Value::Array(inputs)])
}
