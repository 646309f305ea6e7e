//! # courseloom-graph
//!
//! Workflow graph definition and execution for courseloom.
//!
//! A pipeline is a small, declarative graph of named nodes with unconditional
//! and decision-keyed edges, executed sequentially against a mergeable state
//! container. Nodes degrade instead of aborting: failures are recorded in the
//! state's append-only error list and the walk continues, so a caller always
//! gets a state back.
//!
//! ## Core Concepts
//!
//! - **[`PipelineState`]** / **[`StateUpdate`]**: the mergeable record flowing
//!   through a run, with whole-field replacement and append-only errors
//! - **[`Node`]**: one unit of work; reads a snapshot, returns a partial update
//! - **[`GraphBuilder`]** / **[`PipelineGraph`]**: static definition with
//!   construction-time validation (entry, duplicates, branch coverage, cycles)
//! - **[`RunReport`]**: final state plus path, step count, and failure marker
//!
//! ## Example
//!
//! ```rust
//! use courseloom_graph::{FnNode, GraphBuilder, PipelineState, StateUpdate, END};
//!
//! # tokio_test::block_on(async {
//! let graph = GraphBuilder::new()
//!     .node("greet", FnNode::new(|state: PipelineState| async move {
//!         StateUpdate::new().set("greeting", format!("hello, {}", state.text("name")))
//!     }))
//!     .entry("greet")
//!     .edge("greet", END)
//!     .build()
//!     .unwrap();
//!
//! let report = graph.run(PipelineState::new().with_field("name", "loom")).await;
//! assert_eq!(report.state.text("greeting"), "hello, loom");
//! # });
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod edge;
pub mod error;
pub mod executor;
pub mod graph;
pub mod node;
pub mod state;

// Re-exports
pub use edge::{Target, Transition, END};
pub use error::{ExecuteError, GraphError, GraphResult};
pub use executor::{RunOptions, RunReport};
pub use graph::{GraphBuilder, PipelineGraph};
pub use node::{clamp_decision, FnNode, Node};
pub use state::{PipelineState, StateUpdate, StepError};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        clamp_decision, ExecuteError, FnNode, GraphBuilder, GraphError, Node, PipelineGraph,
        PipelineState, RunOptions, RunReport, StateUpdate, StepError, END,
    };
}
