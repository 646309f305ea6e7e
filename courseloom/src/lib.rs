//! # courseloom
//!
//! Workflow-pipeline engine for AI-assisted corporate training content.
//!
//! Five otherwise-independent services (content authoring, assessment,
//! personalization, localization, multimedia) share one architectural core:
//! a short declarative pipeline of steps, each calling a generative model,
//! merging a partial update into shared state, and branching or falling back
//! on runtime decisions and failures. courseloom is that core, extracted:
//!
//! - a **graph engine** with construction-time validation, decision-keyed
//!   branching, and a merge-based state container with append-only errors
//! - **capability providers** behind one trait, with multi-tier fallback
//!   chains for steps that must produce an artifact
//! - the **five pipelines** themselves, ready to wire behind request handlers
//!
//! ## Quick Start
//!
//! ```rust
//! use courseloom::prelude::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let deps = PipelineDeps::new(
//!     Arc::new(MockProvider::new("demo").with_text("direct").with_text(
//!         "Introduction\nObjectives\nSections\nSummary",
//!     )),
//!     Arc::new(InMemoryStore::new()),
//! );
//!
//! let graph = courseloom::pipelines::personalize::graph(deps).unwrap();
//! let report = graph
//!     .run(
//!         PipelineState::new()
//!             .with_field("topic", "secure code review")
//!             .with_field("user_role", "staff engineer"),
//!     )
//!     .await;
//!
//! assert!(report.is_success());
//! assert!(!report.state.text("draft").is_empty());
//! # });
//! ```
//!
//! ## Architecture
//!
//! courseloom is organized as a workspace of focused crates:
//!
//! - [`courseloom_core`] - settings, storage interface, identifiers
//! - [`courseloom_providers`] - provider trait, backends, fallback chains
//! - [`courseloom_graph`] - graph definition, validation, and execution
//! - [`courseloom_pipelines`] - the concrete pipelines

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub use courseloom_core as core;
pub use courseloom_graph as graph;
pub use courseloom_pipelines as pipelines;
pub use courseloom_providers as providers;

// Flattened re-exports of the types most callers need.
pub use courseloom_core::{GenerationSettings, InMemoryStore, Store, StoreError};
pub use courseloom_graph::{
    clamp_decision, ExecuteError, FnNode, GraphBuilder, GraphError, Node, PipelineGraph,
    PipelineState, RunOptions, RunReport, StateUpdate, StepError, END,
};
pub use courseloom_pipelines::PipelineDeps;
pub use courseloom_providers::{
    AllFailed, FallbackChain, GatewayConfig, GatewayProvider, MockProvider, ProviderError,
    TemplateProvider, TextProvider, Tier,
};

/// Prelude for common imports.
pub mod prelude {
    pub use courseloom_core::{GenerationSettings, InMemoryStore, Store};
    pub use courseloom_graph::prelude::*;
    pub use courseloom_pipelines::PipelineDeps;
    pub use courseloom_providers::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_prelude_covers_an_end_to_end_run() {
        let deps = PipelineDeps::new(
            Arc::new(MockProvider::new("smoke").with_text(r#"["Only Module"]"#)),
            Arc::new(InMemoryStore::new()),
        );

        let graph = crate::pipelines::content::graph(deps).unwrap();
        let report = graph
            .run(PipelineState::new().with_field("topic", "smoke"))
            .await;

        assert!(report.is_success());
        assert_eq!(report.state.list("modules"), vec!["Only Module"]);
    }
}
