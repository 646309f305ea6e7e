//! # courseloom-pipelines
//!
//! The five content pipelines of the training platform, built on the
//! courseloom engine:
//!
//! - **[`content`]**: plan → write_modules → assemble
//! - **[`personalize`]**: classify → {retrieve | pretest | direct} → draft → review
//! - **[`localize`]**: translate → review → finalize
//! - **[`media`]**: route → {illustrate | summarize}, with a three-tier
//!   illustration fallback ladder
//! - **[`assess`]**: template-driven assessment generation
//!
//! Each module exposes a `graph(deps)` constructor returning a validated
//! [`courseloom_graph::PipelineGraph`]; collaborators are injected through
//! [`PipelineDeps`].
//!
//! ## Example
//!
//! ```rust
//! use courseloom_core::InMemoryStore;
//! use courseloom_graph::PipelineState;
//! use courseloom_pipelines::{content, PipelineDeps};
//! use courseloom_providers::MockProvider;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let deps = PipelineDeps::new(
//!     Arc::new(MockProvider::new("demo")),
//!     Arc::new(InMemoryStore::new()),
//! );
//!
//! let graph = content::graph(deps).unwrap();
//! let report = graph
//!     .run(PipelineState::new().with_field("topic", "code review"))
//!     .await;
//! assert!(report.is_success());
//! # });
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod assess;
pub mod content;
pub mod deps;
pub mod localize;
pub mod media;
pub mod parse;
pub mod personalize;

// Re-exports
pub use deps::PipelineDeps;
pub use media::{render_diagram, ImageArtifact};
pub use parse::{parse_title_list, ParseError};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{parse_title_list, ParseError, PipelineDeps};
}
