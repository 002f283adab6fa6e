//! Sequential and parallel pipeline execution.
//!
//! A [`Runner`] walks a pipeline's topological layering and drives catalog
//! load/save calls. [`SequentialRunner`] is the single-threaded correctness
//! baseline; [`ParallelRunner`] dispatches independent nodes to a bounded
//! worker pool and must produce identical final catalog contents.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use catalog::DataCatalog;
use pipeline::Pipeline;
use serde_json::Value;

pub mod context;
pub mod error;
pub mod parallel;
pub mod sequential;

mod plan;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{ContextError, ProjectContext};
pub use error::RunnerError;
pub use parallel::ParallelRunner;
pub use sequential::SequentialRunner;

/// Executes every node of a pipeline exactly once, respecting dependency
/// order.
///
/// Returns the loaded values of pipeline outputs that were not registered
/// in the catalog (free outputs). Partial outputs already saved when a node
/// fails remain in the catalog; persistence is not transactional across
/// nodes.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(
        &self,
        pipeline: &Pipeline,
        catalog: Arc<DataCatalog>,
    ) -> Result<BTreeMap<String, Value>, RunnerError>;
}
