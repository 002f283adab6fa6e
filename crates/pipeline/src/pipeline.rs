//! The immutable node graph and its derived structure.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Write as _,
    sync::Arc,
};

use common::DatasetName;
use itertools::Itertools as _;

use crate::{Node, PipelineError};

/// An immutable DAG of nodes with a topological layering.
///
/// Construction validates the graph: every output has exactly one producer
/// and no dependency cycle exists. Nodes within one layer have no
/// dependency relationship, which is what licenses running them
/// concurrently. All filtering operations return new pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// All nodes in topological order (layer by layer, declaration order
    /// within a layer).
    nodes: Vec<Arc<Node>>,
    layers: Vec<Vec<Arc<Node>>>,
}

impl Pipeline {
    /// Builds a pipeline from an unordered collection of nodes.
    pub fn new(nodes: Vec<Node>) -> Result<Self, PipelineError> {
        Self::from_arcs(nodes.into_iter().map(Arc::new).collect())
    }

    fn from_arcs(declared: Vec<Arc<Node>>) -> Result<Self, PipelineError> {
        let producers = producers_by_output(&declared)?;

        // deps[i] = indices of nodes that produce one of node i's inputs.
        let deps: Vec<BTreeSet<usize>> = declared
            .iter()
            .map(|node| {
                node.inputs()
                    .iter()
                    .filter_map(|input| producers.get(input).copied())
                    .collect()
            })
            .collect();

        let mut placed = vec![false; declared.len()];
        let mut layers: Vec<Vec<Arc<Node>>> = Vec::new();
        let mut remaining = declared.len();

        while remaining > 0 {
            let layer: Vec<usize> = (0..declared.len())
                .filter(|&i| !placed[i] && deps[i].iter().all(|&dep| placed[dep]))
                .collect();

            if layer.is_empty() {
                return Err(PipelineError::CircularDependency {
                    cycle: witness_cycle(&declared, &deps, &placed),
                });
            }

            remaining -= layer.len();
            for &i in &layer {
                placed[i] = true;
            }
            layers.push(layer.into_iter().map(|i| declared[i].clone()).collect());
        }

        let nodes = layers.iter().flatten().cloned().collect();
        Ok(Pipeline { nodes, layers })
    }

    /// All nodes in a valid execution order.
    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    /// The topological partition: nodes in one group are mutually
    /// independent and depend only on earlier groups.
    pub fn grouped_nodes(&self) -> &[Vec<Arc<Node>>] {
        &self.layers
    }

    /// The widest layer, which bounds useful worker parallelism.
    pub fn max_layer_width(&self) -> usize {
        self.layers.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Dataset names consumed by the pipeline but produced outside it.
    pub fn inputs(&self) -> BTreeSet<DatasetName> {
        let produced: BTreeSet<_> = self.all_outputs();
        self.nodes
            .iter()
            .flat_map(|node| node.inputs())
            .filter(|name| !produced.contains(*name))
            .cloned()
            .collect()
    }

    /// Dataset names produced by the pipeline and not consumed within it.
    pub fn outputs(&self) -> BTreeSet<DatasetName> {
        let consumed: BTreeSet<_> = self
            .nodes
            .iter()
            .flat_map(|node| node.inputs())
            .collect();
        self.all_outputs()
            .into_iter()
            .filter(|name| !consumed.contains(name))
            .collect()
    }

    /// Every dataset name any node produces.
    pub fn all_outputs(&self) -> BTreeSet<DatasetName> {
        self.nodes
            .iter()
            .flat_map(|node| node.outputs())
            .cloned()
            .collect()
    }

    /// Every dataset name the pipeline references.
    pub fn data_sets(&self) -> BTreeSet<DatasetName> {
        self.nodes
            .iter()
            .flat_map(|node| node.inputs().iter().chain(node.outputs()))
            .cloned()
            .collect()
    }

    /// A human-readable rendering of the execution order.
    pub fn describe(&self) -> String {
        let mut rendered = String::from("Pipeline execution order:\n");
        for (i, layer) in self.layers.iter().enumerate() {
            let names = layer.iter().map(|node| node.name()).join(", ");
            // Writing to a String cannot fail.
            let _ = writeln!(rendered, "  {i}: {names}");
        }
        rendered
    }

    /// A new pipeline containing exactly the named nodes.
    pub fn only_nodes(&self, names: &[&str]) -> Result<Pipeline, PipelineError> {
        let selected = names
            .iter()
            .map(|name| {
                self.nodes
                    .iter()
                    .find(|node| node.name() == *name)
                    .cloned()
                    .ok_or_else(|| PipelineError::UnknownNode {
                        name: name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_arcs(selected)
    }

    /// A new pipeline containing the nodes whose tag set intersects `tags`.
    ///
    /// The result may be empty; callers decide whether that is an error.
    pub fn only_nodes_with_tags(&self, tags: &[&str]) -> Result<Pipeline, PipelineError> {
        let selected = self
            .nodes
            .iter()
            .filter(|node| node.has_any_tag(tags))
            .cloned()
            .collect();
        Self::from_arcs(selected)
    }

    /// A new pipeline containing the nodes whose names live under
    /// `namespace.` prefixes.
    pub fn only_nodes_with_namespace(&self, namespace: &str) -> Result<Pipeline, PipelineError> {
        let prefix = format!("{namespace}.");
        let selected: Vec<_> = self
            .nodes
            .iter()
            .filter(|node| node.name().starts_with(&prefix))
            .cloned()
            .collect();
        if selected.is_empty() {
            return Err(PipelineError::EmptyNamespace {
                namespace: namespace.to_string(),
            });
        }
        Self::from_arcs(selected)
    }

    /// A new pipeline of all nodes that depend on the given dataset names,
    /// directly or transitively.
    pub fn from_inputs(&self, names: &[&str]) -> Result<Pipeline, PipelineError> {
        let mut available = self.parse_known_names(names)?;
        let mut included = vec![false; self.nodes.len()];

        let mut progressed = true;
        while progressed {
            progressed = false;
            for (i, node) in self.nodes.iter().enumerate() {
                if included[i] {
                    continue;
                }
                if node.inputs().iter().any(|input| available.contains(input)) {
                    included[i] = true;
                    progressed = true;
                    available.extend(node.outputs().iter().cloned());
                }
            }
        }

        self.subset(&included)
    }

    /// A new pipeline of all nodes required to produce the given dataset
    /// names.
    pub fn to_outputs(&self, names: &[&str]) -> Result<Pipeline, PipelineError> {
        let mut needed = self.parse_known_names(names)?;
        let mut included = vec![false; self.nodes.len()];

        let mut progressed = true;
        while progressed {
            progressed = false;
            for (i, node) in self.nodes.iter().enumerate() {
                if included[i] {
                    continue;
                }
                if node.outputs().iter().any(|output| needed.contains(output)) {
                    included[i] = true;
                    progressed = true;
                    needed.extend(node.inputs().iter().cloned());
                }
            }
        }

        self.subset(&included)
    }

    /// The union of two pipelines, re-validated as one graph.
    pub fn combine(&self, other: &Pipeline) -> Result<Pipeline, PipelineError> {
        let mut merged = self.nodes.clone();
        for node in &other.nodes {
            if !merged.iter().any(|existing| Arc::ptr_eq(existing, node)) {
                merged.push(node.clone());
            }
        }
        Self::from_arcs(merged)
    }

    fn parse_known_names(&self, names: &[&str]) -> Result<BTreeSet<DatasetName>, PipelineError> {
        let known = self.data_sets();
        names
            .iter()
            .map(|raw| {
                let name: DatasetName =
                    raw.parse().map_err(|_| PipelineError::UnknownDataSet {
                        name: raw.to_string(),
                    })?;
                if !known.contains(&name) {
                    return Err(PipelineError::UnknownDataSet {
                        name: raw.to_string(),
                    });
                }
                Ok(name)
            })
            .collect()
    }

    fn subset(&self, included: &[bool]) -> Result<Pipeline, PipelineError> {
        let selected = self
            .nodes
            .iter()
            .zip(included)
            .filter(|(_, keep)| **keep)
            .map(|(node, _)| node.clone())
            .collect();
        Self::from_arcs(selected)
    }
}

fn producers_by_output(
    nodes: &[Arc<Node>],
) -> Result<BTreeMap<DatasetName, usize>, PipelineError> {
    let mut producers: BTreeMap<DatasetName, usize> = BTreeMap::new();
    for (i, node) in nodes.iter().enumerate() {
        for output in node.outputs() {
            if let Some(&first) = producers.get(output) {
                return Err(PipelineError::OutputNotUnique {
                    name: output.clone(),
                    first: nodes[first].name().to_string(),
                    second: node.name().to_string(),
                });
            }
            producers.insert(output.clone(), i);
        }
    }
    Ok(producers)
}

/// Extracts one cycle from the unplaceable remainder of the graph.
///
/// Every unplaced node has at least one unplaced dependency, so following
/// those edges must revisit a node.
fn witness_cycle(nodes: &[Arc<Node>], deps: &[BTreeSet<usize>], placed: &[bool]) -> Vec<String> {
    let Some(start) = (0..nodes.len()).find(|&i| !placed[i]) else {
        return Vec::new();
    };

    let mut path = vec![start];
    loop {
        let current = path[path.len() - 1];
        let Some(&next) = deps[current].iter().find(|&&dep| !placed[dep]) else {
            // Unreachable given the caller's invariant; avoid looping forever.
            return path.iter().map(|&i| nodes[i].name().to_string()).collect();
        };

        if let Some(pos) = path.iter().position(|&i| i == next) {
            let mut cycle: Vec<String> = path[pos..]
                .iter()
                .map(|&i| nodes[i].name().to_string())
                .collect();
            cycle.push(nodes[next].name().to_string());
            return cycle;
        }
        path.push(next);
    }
}
