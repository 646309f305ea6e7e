//! Graph edge types.
//!
//! Transitions come in two shapes: an unconditional edge to the next node,
//! and a branch table keyed on a decision field's value. Targets name either
//! another node or the terminal [`END`] marker.

use indexmap::IndexMap;

/// Reserved name for the terminal marker.
///
/// An edge to `END` makes the source node terminal.
pub const END: &str = "__end__";

/// Where a transition leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Another node, by name.
    Node(String),
    /// The end of the pipeline.
    End,
}

impl Target {
    /// Parse a target from a name, mapping [`END`] to [`Target::End`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name == END {
            Target::End
        } else {
            Target::Node(name.to_string())
        }
    }

    /// The node name, if this target is a node.
    #[must_use]
    pub fn as_node(&self) -> Option<&str> {
        match self {
            Target::Node(name) => Some(name),
            Target::End => None,
        }
    }
}

/// A node's outgoing transition.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Always taken.
    Direct(Target),
    /// Selected by the value of a decision field.
    Branch {
        /// State field holding the decision value.
        field: String,
        /// Decision value to target, covering the declared enumeration.
        table: IndexMap<String, Target>,
    },
}

impl Transition {
    /// Every target this transition can reach.
    pub fn targets(&self) -> Vec<&Target> {
        match self {
            Transition::Direct(target) => vec![target],
            Transition::Branch { table, .. } => table.values().collect(),
        }
    }
}
