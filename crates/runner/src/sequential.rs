//! Single-threaded runner.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use catalog::DataCatalog;
use pipeline::Pipeline;
use serde_json::Value;

use crate::{
    Runner, RunnerError,
    plan::{collect_free_outputs, execute_node, prepare, release_consumed},
};

/// Executes nodes one at a time in topological order.
///
/// Within a layer, nodes run in declaration order, which makes this the
/// deterministic semantic reference the parallel runner must match.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialRunner;

impl SequentialRunner {
    pub fn new() -> Self {
        SequentialRunner
    }
}

#[async_trait]
impl Runner for SequentialRunner {
    async fn run(
        &self,
        pipeline: &Pipeline,
        catalog: Arc<DataCatalog>,
    ) -> Result<BTreeMap<String, Value>, RunnerError> {
        let mut plan = prepare(pipeline, &catalog).await?;
        let total = pipeline.nodes().len();

        for (completed, node) in pipeline.nodes().iter().enumerate() {
            execute_node(node, &catalog).await?;
            release_consumed(node, &catalog, &mut plan)?;
            tracing::info!(
                node = %node.name(),
                "completed node ({} out of {total})",
                completed + 1,
            );
        }

        collect_free_outputs(&catalog, &plan).await
    }
}
