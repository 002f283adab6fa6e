//! Structural pipeline errors.
//!
//! All of these are raised at pipeline construction or filtering time,
//! before any node executes.

use common::{DatasetName, NameError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The node dependency graph contains a cycle.
    ///
    /// Carries one witness cycle as a list of node names, first node
    /// repeated at the end.
    #[error("pipeline contains a circular dependency: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Two nodes declare the same output dataset.
    #[error("output '{name}' is produced by both '{first}' and '{second}'")]
    OutputNotUnique {
        name: DatasetName,
        first: String,
        second: String,
    },

    /// A filter referenced a node name that is not in the pipeline.
    #[error("pipeline does not contain node '{name}'")]
    UnknownNode { name: String },

    /// A filter referenced a dataset name that is not in the pipeline.
    #[error("pipeline does not contain dataset '{name}'")]
    UnknownDataSet { name: String },

    /// A namespace filter matched no nodes.
    #[error("pipeline contains no nodes with namespace '{namespace}'")]
    EmptyNamespace { namespace: String },

    /// A declared input or output is not a valid dataset name.
    #[error(transparent)]
    Name(#[from] NameError),
}
