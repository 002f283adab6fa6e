//! Shared run preparation and node execution.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use catalog::DataCatalog;
use common::DatasetName;
use datasets::{DatasetError, MemoryDataset};
use pipeline::{Node, Pipeline};
use serde_json::Value;

use crate::RunnerError;

/// Bookkeeping both runner variants share.
///
/// Load counts drive eviction: when the last not-yet-executed consumer of a
/// dataset finishes, the dataset is released, unless it is a pipeline-level
/// input or output.
pub(crate) struct RunPlan {
    /// Pipeline outputs that were auto-bound and should be returned to the
    /// caller after the run.
    pub free_outputs: BTreeSet<DatasetName>,
    /// Remaining consumer count per dataset name.
    pub load_counts: BTreeMap<DatasetName, usize>,
    /// Names eligible for release once their count reaches zero.
    pub releasable: BTreeSet<DatasetName>,
}

/// Validates the catalog against the pipeline and builds the run plan.
///
/// Names the pipeline references but the catalog does not know are bound to
/// in-memory defaults with a warning. Auto-bound pipeline inputs must have
/// been fed by the caller; absence fails the run before any node executes.
pub(crate) async fn prepare(
    pipeline: &Pipeline,
    catalog: &DataCatalog,
) -> Result<RunPlan, RunnerError> {
    let inputs = pipeline.inputs();
    let outputs = pipeline.outputs();

    let mut auto_bound = BTreeSet::new();
    for name in pipeline.data_sets() {
        if !catalog.contains(&name) {
            tracing::warn!(
                dataset = %name,
                "dataset is not registered in the catalog, binding an in-memory default"
            );
            catalog.add(name.clone(), Arc::new(MemoryDataset::new(name.clone())))?;
            auto_bound.insert(name);
        }
    }

    for name in &inputs {
        if auto_bound.contains(name) && !catalog.exists(name).await? {
            return Err(RunnerError::Dataset(DatasetError::MissingData {
                name: name.clone(),
            }));
        }
    }

    let mut load_counts: BTreeMap<DatasetName, usize> = BTreeMap::new();
    for node in pipeline.nodes() {
        for input in node.inputs() {
            *load_counts.entry(input.clone()).or_insert(0) += 1;
        }
    }

    let releasable = pipeline
        .data_sets()
        .into_iter()
        .filter(|name| !inputs.contains(name) && !outputs.contains(name))
        .collect();

    let free_outputs = outputs.intersection(&auto_bound).cloned().collect();

    Ok(RunPlan {
        free_outputs,
        load_counts,
        releasable,
    })
}

/// Loads a node's inputs, runs it, and saves its outputs.
pub(crate) async fn execute_node(node: &Node, catalog: &DataCatalog) -> Result<(), RunnerError> {
    let mut inputs = Vec::with_capacity(node.inputs().len());
    for name in node.inputs() {
        inputs.push(catalog.load(name).await?);
    }

    let outputs = node.run(inputs).map_err(|source| RunnerError::NodeFailed {
        node: node.name().to_string(),
        source,
    })?;

    if outputs.len() != node.outputs().len() {
        return Err(RunnerError::OutputArity {
            node: node.name().to_string(),
            expected: node.outputs().len(),
            actual: outputs.len(),
        });
    }

    for (name, value) in node.outputs().iter().zip(&outputs) {
        catalog.save(name, value).await?;
    }

    Ok(())
}

/// Decrements the counts of a completed node's inputs and releases the
/// datasets no remaining node will consume.
pub(crate) fn release_consumed(
    node: &Node,
    catalog: &DataCatalog,
    plan: &mut RunPlan,
) -> Result<(), RunnerError> {
    for input in node.inputs() {
        let Some(count) = plan.load_counts.get_mut(input) else {
            continue;
        };
        *count = count.saturating_sub(1);
        if *count == 0 && plan.releasable.contains(input) {
            catalog.release(input)?;
        }
    }
    Ok(())
}

/// Loads the values of auto-bound pipeline outputs for the caller.
pub(crate) async fn collect_free_outputs(
    catalog: &DataCatalog,
    plan: &RunPlan,
) -> Result<BTreeMap<String, Value>, RunnerError> {
    let mut collected = BTreeMap::new();
    for name in &plan.free_outputs {
        collected.insert(name.to_string(), catalog.load(name).await?);
    }
    Ok(collected)
}
