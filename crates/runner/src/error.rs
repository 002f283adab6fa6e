//! Runner errors.

use common::BoxError;
use datasets::DatasetError;

/// Errors raised while executing a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A node's function returned an error.
    #[error("node '{node}' failed")]
    NodeFailed {
        node: String,
        #[source]
        source: BoxError,
    },

    /// A worker task panicked while executing a node.
    #[error("a pipeline worker panicked")]
    WorkerPanicked,

    /// A node returned a different number of values than it declares
    /// outputs.
    #[error("node '{node}' returned {actual} outputs, expected {expected}")]
    OutputArity {
        node: String,
        expected: usize,
        actual: usize,
    },

    /// A catalog load or save failed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Binding a default dataset failed.
    #[error(transparent)]
    Catalog(#[from] catalog::CatalogConfigError),
}
