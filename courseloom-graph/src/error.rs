//! Graph error types.

use std::time::Duration;
use thiserror::Error;

/// Configuration errors detected while building a graph.
///
/// Every variant is a construction-time defect: a graph that fails validation
/// is never usable, so none of these can surface during a run.
#[derive(Error, Debug)]
pub enum GraphError {
    /// No entry node defined.
    #[error("no entry node defined")]
    NoEntryNode,

    /// A referenced node is not registered.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Two nodes registered under the same name.
    #[error("duplicate node name: {0}")]
    DuplicateNode(String),

    /// A node was given more than one outgoing transition.
    #[error("node '{0}' has more than one outgoing transition")]
    ConflictingTransitions(String),

    /// A branch routes on a decision field with no declared enumeration.
    #[error("branch from '{from}' routes on undeclared decision field '{field}'")]
    UndeclaredDecision {
        /// Branching node.
        from: String,
        /// Decision field name.
        field: String,
    },

    /// A branch table misses a declared decision value.
    #[error("branch from '{from}' does not cover decision value '{value}' of field '{field}'")]
    NonExhaustiveBranch {
        /// Branching node.
        from: String,
        /// Decision field name.
        field: String,
        /// Uncovered value.
        value: String,
    },

    /// A branch table maps a value outside the declared enumeration.
    #[error("branch from '{from}' maps unknown decision value '{value}' for field '{field}'")]
    UnknownDecisionValue {
        /// Branching node.
        from: String,
        /// Decision field name.
        field: String,
        /// Out-of-enumeration value.
        value: String,
    },

    /// The edge relation contains a cycle.
    #[error("cycle detected in graph")]
    CycleDetected,

    /// Other error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl GraphError {
    /// Create a node not found error.
    pub fn node_not_found(name: impl Into<String>) -> Self {
        Self::NodeNotFound(name.into())
    }
}

/// Result type for graph construction.
pub type GraphResult<T> = Result<T, GraphError>;

/// Abnormal termination of a pipeline run.
///
/// Node and provider failures never surface here; they are recorded inside
/// the state's error list. The only way a run ends abnormally is the caller's
/// deadline elapsing while a node is blocked.
#[derive(Error, Debug)]
pub enum ExecuteError {
    /// The overall deadline elapsed before the run finished.
    #[error("pipeline run exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),
}
