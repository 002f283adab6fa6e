//! Pipeline nodes: named pure transformations with declared I/O.

use std::{collections::BTreeSet, sync::Arc};

use common::{BoxResult, DatasetName, NameError};
use serde_json::Value;

/// The callable a node wraps.
///
/// Receives one loaded value per declared input, in declaration order, and
/// must return one value per declared output, in declaration order.
pub type NodeFunc = Arc<dyn Fn(Vec<Value>) -> BoxResult<Vec<Value>> + Send + Sync>;

/// A named pure transformation step.
///
/// Nodes are constructed once when the pipeline is declared and are
/// immutable thereafter. A node with zero outputs is a terminal
/// side-effecting step.
#[derive(Clone)]
pub struct Node {
    name: String,
    inputs: Vec<DatasetName>,
    outputs: Vec<DatasetName>,
    tags: BTreeSet<String>,
    func: NodeFunc,
}

/// Creates a node from a function and its input/output dataset names.
///
/// The default node name is derived from the declared I/O; use
/// [`Node::named`] to attach a meaningful one.
pub fn node<F>(func: F, inputs: &[&str], outputs: &[&str]) -> Result<Node, NameError>
where
    F: Fn(Vec<Value>) -> BoxResult<Vec<Value>> + Send + Sync + 'static,
{
    let inputs = inputs
        .iter()
        .map(|name| name.parse())
        .collect::<Result<Vec<DatasetName>, _>>()?;
    let outputs = outputs
        .iter()
        .map(|name| name.parse())
        .collect::<Result<Vec<DatasetName>, _>>()?;

    let name = derived_name(&inputs, &outputs);

    Ok(Node {
        name,
        inputs,
        outputs,
        tags: BTreeSet::new(),
        func: Arc::new(func),
    })
}

fn derived_name(inputs: &[DatasetName], outputs: &[DatasetName]) -> String {
    let join = |names: &[DatasetName]| {
        names
            .iter()
            .map(DatasetName::as_str)
            .collect::<Vec<_>>()
            .join(",")
    };
    format!("[{}] -> [{}]", join(inputs), join(outputs))
}

impl Node {
    /// Replaces the derived name with an explicit one.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds tags to the node.
    pub fn tagged(mut self, tags: &[&str]) -> Self {
        self.tags.extend(tags.iter().map(|tag| tag.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[DatasetName] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[DatasetName] {
        &self.outputs
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Whether any of `tags` appears in this node's tag set.
    pub fn has_any_tag<T: AsRef<str>>(&self, tags: &[T]) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag.as_ref()))
    }

    /// Runs the wrapped function on already-loaded input values.
    pub fn run(&self, inputs: Vec<Value>) -> BoxResult<Vec<Value>> {
        (self.func)(inputs)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.name.fmt(f)
    }
}
