//! Graph definition and construction-time validation.
//!
//! A [`PipelineGraph`] is built once at startup from static definitions and
//! shared across concurrent runs. Everything that can be wrong with a
//! definition (missing entry, duplicate names, dangling edges, uncovered
//! decision values, cycles) is rejected by [`GraphBuilder::build`], never
//! discovered mid-run.

use crate::edge::{Target, Transition};
use crate::error::{GraphError, GraphResult};
use crate::node::Node;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Builder for a pipeline graph.
pub struct GraphBuilder {
    name: Option<String>,
    nodes: IndexMap<String, Arc<dyn Node>>,
    entry: Option<String>,
    transitions: IndexMap<String, Transition>,
    decisions: IndexMap<String, Vec<String>>,
    duplicate_nodes: Vec<String>,
    conflicting: Vec<String>,
}

impl GraphBuilder {
    /// Create a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: None,
            nodes: IndexMap::new(),
            entry: None,
            transitions: IndexMap::new(),
            decisions: IndexMap::new(),
            duplicate_nodes: Vec::new(),
            conflicting: Vec::new(),
        }
    }

    /// Set the graph name (used in run telemetry).
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Register a node under a unique name.
    #[must_use]
    pub fn node(mut self, name: impl Into<String>, node: impl Node + 'static) -> Self {
        let name = name.into();
        if self.nodes.insert(name.clone(), Arc::new(node)).is_some() {
            self.duplicate_nodes.push(name);
        }
        self
    }

    /// Set the entry node.
    #[must_use]
    pub fn entry(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Add an unconditional edge. `to` may be [`END`](crate::edge::END).
    #[must_use]
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let from = from.into();
        let transition = Transition::Direct(Target::parse(&to.into()));
        if self.transitions.insert(from.clone(), transition).is_some() {
            self.conflicting.push(from);
        }
        self
    }

    /// Declare the closed enumeration for a decision field.
    ///
    /// Every branch routing on `field` is validated against this set: the
    /// table must cover every declared value and may not map any other.
    #[must_use]
    pub fn decision(mut self, field: impl Into<String>, options: &[&str]) -> Self {
        self.decisions.insert(
            field.into(),
            options.iter().map(|s| (*s).to_string()).collect(),
        );
        self
    }

    /// Add a conditional edge keyed on a decision field.
    ///
    /// `table` maps each decision value to a target node (or
    /// [`END`](crate::edge::END)).
    #[must_use]
    pub fn branch(
        mut self,
        from: impl Into<String>,
        field: impl Into<String>,
        table: &[(&str, &str)],
    ) -> Self {
        let from = from.into();
        let transition = Transition::Branch {
            field: field.into(),
            table: table
                .iter()
                .map(|(value, to)| ((*value).to_string(), Target::parse(to)))
                .collect(),
        };
        if self.transitions.insert(from.clone(), transition).is_some() {
            self.conflicting.push(from);
        }
        self
    }

    /// Validate and freeze the graph.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] describing the first defect found; a graph
    /// that fails here is unusable.
    pub fn build(self) -> GraphResult<PipelineGraph> {
        if let Some(name) = self.duplicate_nodes.first() {
            return Err(GraphError::DuplicateNode(name.clone()));
        }
        if let Some(name) = self.conflicting.first() {
            return Err(GraphError::ConflictingTransitions(name.clone()));
        }

        let entry = self.entry.clone().ok_or(GraphError::NoEntryNode)?;
        if !self.nodes.contains_key(&entry) {
            return Err(GraphError::node_not_found(&entry));
        }

        for (from, transition) in &self.transitions {
            if !self.nodes.contains_key(from) {
                return Err(GraphError::node_not_found(from));
            }
            for target in transition.targets() {
                if let Some(node) = target.as_node() {
                    if !self.nodes.contains_key(node) {
                        return Err(GraphError::node_not_found(node));
                    }
                }
            }
            if let Transition::Branch { field, table } = transition {
                let declared = self.decisions.get(field).ok_or_else(|| {
                    GraphError::UndeclaredDecision {
                        from: from.clone(),
                        field: field.clone(),
                    }
                })?;
                for value in declared {
                    if !table.contains_key(value) {
                        return Err(GraphError::NonExhaustiveBranch {
                            from: from.clone(),
                            field: field.clone(),
                            value: value.clone(),
                        });
                    }
                }
                for value in table.keys() {
                    if !declared.contains(value) {
                        return Err(GraphError::UnknownDecisionValue {
                            from: from.clone(),
                            field: field.clone(),
                            value: value.clone(),
                        });
                    }
                }
            }
        }

        self.check_acyclic()?;

        Ok(PipelineGraph {
            name: self.name,
            nodes: self.nodes,
            entry,
            transitions: self.transitions,
        })
    }

    fn check_acyclic(&self) -> GraphResult<()> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for (from, transition) in &self.transitions {
            let entry = adjacency.entry(from.as_str()).or_default();
            for target in transition.targets() {
                if let Some(node) = target.as_node() {
                    entry.push(node);
                }
            }
        }

        let mut visiting = HashSet::new();
        let mut visited = HashSet::new();
        for node in self.nodes.keys() {
            if detect_cycle(node, &adjacency, &mut visiting, &mut visited) {
                return Err(GraphError::CycleDetected);
            }
        }
        Ok(())
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_cycle<'a>(
    node: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    visiting: &mut HashSet<&'a str>,
    visited: &mut HashSet<&'a str>,
) -> bool {
    if visited.contains(node) {
        return false;
    }
    if visiting.contains(node) {
        return true;
    }

    visiting.insert(node);
    if let Some(neighbors) = adjacency.get(node) {
        for neighbor in neighbors {
            if detect_cycle(neighbor, adjacency, visiting, visited) {
                return true;
            }
        }
    }
    visiting.remove(node);
    visited.insert(node);
    false
}

/// An immutable, validated pipeline graph.
///
/// Safe to share across concurrent runs; each run owns its own state.
pub struct PipelineGraph {
    name: Option<String>,
    nodes: IndexMap<String, Arc<dyn Node>>,
    entry: String,
    transitions: IndexMap<String, Transition>,
}

impl PipelineGraph {
    /// Start building a graph.
    #[must_use]
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Get the graph name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the entry node name.
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Get node count.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node names in registration order.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub(crate) fn node(&self, name: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(name)
    }

    pub(crate) fn transition_for(&self, name: &str) -> Option<&Transition> {
        self.transitions.get(name)
    }
}

impl std::fmt::Debug for PipelineGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineGraph")
            .field("name", &self.name)
            .field("entry", &self.entry)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .finish()
    }
}
