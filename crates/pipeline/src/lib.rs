//! Node graph, structural validation, and topological layering for weir.
//!
//! A [`Pipeline`] is an immutable DAG of [`Node`]s wired together by the
//! dataset names they consume and produce. Structural faults (duplicate
//! producers, cycles) are rejected at construction time, before anything
//! executes.

pub mod error;
pub mod node;
pub mod pipeline;

pub use error::PipelineError;
pub use node::{Node, NodeFunc, node};
pub use pipeline::Pipeline;
