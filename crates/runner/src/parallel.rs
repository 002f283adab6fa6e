//! Worker-pool runner.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::Arc,
};

use async_trait::async_trait;
use catalog::DataCatalog;
use common::DatasetName;
use pipeline::Pipeline;
use serde_json::Value;
use tokio::task::JoinSet;

use crate::{
    Runner, RunnerError,
    plan::{collect_free_outputs, execute_node, prepare, release_consumed},
};

/// Executes independent nodes concurrently on a bounded pool of workers.
///
/// The coordinator alone owns the scheduling state (remaining dependency
/// counts, the ready queue, and load counts); workers receive a node and a
/// catalog handle, and report back only through task completion. Two nodes
/// with a dependency edge are strictly ordered; two without one may run in
/// any order.
///
/// On the first failure no new node is dispatched. Workers already running
/// are left to drain so no save is cut off mid-write, then the original
/// failure is returned.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelRunner {
    max_workers: Option<usize>,
}

impl ParallelRunner {
    pub fn new() -> Self {
        ParallelRunner::default()
    }

    /// Caps the worker pool below the default
    /// `min(available parallelism, widest layer)`.
    pub fn with_max_workers(max_workers: usize) -> Self {
        ParallelRunner {
            max_workers: Some(max_workers),
        }
    }

    fn pool_size(&self, pipeline: &Pipeline) -> usize {
        let available = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        self.max_workers
            .unwrap_or(available)
            .min(pipeline.max_layer_width())
            .max(1)
    }
}

#[async_trait]
impl Runner for ParallelRunner {
    async fn run(
        &self,
        pipeline: &Pipeline,
        catalog: Arc<DataCatalog>,
    ) -> Result<BTreeMap<String, Value>, RunnerError> {
        let mut plan = prepare(pipeline, &catalog).await?;

        let nodes = pipeline.nodes();
        let total = nodes.len();

        // Producer index per dataset name; unique by pipeline validation.
        let producers: BTreeMap<&DatasetName, usize> = nodes
            .iter()
            .enumerate()
            .flat_map(|(i, node)| node.outputs().iter().map(move |output| (output, i)))
            .collect();

        let mut pending_deps = vec![0usize; total];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); total];
        for (i, node) in nodes.iter().enumerate() {
            for input in node.inputs() {
                if let Some(&producer) = producers.get(input) {
                    pending_deps[i] += 1;
                    dependents[producer].push(i);
                }
            }
        }

        // `nodes` is already topologically ordered, so the initial ready
        // queue preserves declaration order within the first layer.
        let mut ready: VecDeque<usize> = (0..total).filter(|&i| pending_deps[i] == 0).collect();

        let pool_size = self.pool_size(pipeline);
        tracing::debug!(workers = pool_size, nodes = total, "starting parallel run");

        let mut join_set: JoinSet<(usize, Result<(), RunnerError>)> = JoinSet::new();
        let mut in_flight = 0usize;
        let mut completed = 0usize;
        let mut failure: Option<RunnerError> = None;

        loop {
            while failure.is_none() && in_flight < pool_size {
                let Some(i) = ready.pop_front() else { break };
                let node = nodes[i].clone();
                let catalog = catalog.clone();
                join_set.spawn(async move { (i, execute_node(&node, &catalog).await) });
                in_flight += 1;
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            in_flight -= 1;

            match joined {
                Ok((i, Ok(()))) => {
                    completed += 1;
                    tracing::info!(
                        node = %nodes[i].name(),
                        "completed node ({completed} out of {total})",
                    );

                    release_consumed(&nodes[i], &catalog, &mut plan)?;
                    for &dependent in &dependents[i] {
                        pending_deps[dependent] -= 1;
                        if pending_deps[dependent] == 0 {
                            ready.push_back(dependent);
                        }
                    }
                }
                Ok((i, Err(err))) => {
                    tracing::error!(node = %nodes[i].name(), error = %err, "node failed");
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
                Err(join_err) => {
                    tracing::error!(error = %join_err, "pipeline worker panicked");
                    if failure.is_none() {
                        failure = Some(RunnerError::WorkerPanicked);
                    }
                }
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }

        collect_free_outputs(&catalog, &plan).await
    }
}
