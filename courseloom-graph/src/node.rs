//! Graph node types.
//!
//! A node is one unit of work: it reads the state snapshot, optionally calls
//! a capability provider, and returns a partial update. The trait has no
//! error channel: a node that hits an internal failure encodes it into the
//! update's error list and returns a safe default for the affected field, so
//! execution degrades instead of aborting.

use crate::state::{PipelineState, StateUpdate};
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

/// One unit of work in a pipeline.
///
/// Nodes are registered under a unique name in the graph builder; the trait
/// itself only defines execution. Implementations must not mutate their
/// input snapshot and must catch internal failures rather than panic.
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute against a read-only snapshot, returning a partial update.
    async fn run(&self, state: &PipelineState) -> StateUpdate;
}

/// A node backed by an async function.
///
/// The function receives its own clone of the snapshot, which keeps closures
/// free of borrow gymnastics.
pub struct FnNode<F, Fut>
where
    F: Fn(PipelineState) -> Fut + Send + Sync,
    Fut: Future<Output = StateUpdate> + Send,
{
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnNode<F, Fut>
where
    F: Fn(PipelineState) -> Fut + Send + Sync,
    Fut: Future<Output = StateUpdate> + Send,
{
    /// Create a new function node.
    pub fn new(func: F) -> Self {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> Node for FnNode<F, Fut>
where
    F: Fn(PipelineState) -> Fut + Send + Sync,
    Fut: Future<Output = StateUpdate> + Send,
{
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        (self.func)(state.clone()).await
    }
}

/// Clamp raw classifier output to a closed decision enumeration.
///
/// Scans `options` in declared order and returns the first one contained in
/// the lowercased raw text; ambiguous or unrecognized output falls back to
/// `default`. Edge resolution therefore only ever sees in-enumeration values,
/// no matter what the classifier produced.
#[must_use]
pub fn clamp_decision(raw: &str, options: &[&str], default: &str) -> String {
    let lowered = raw.to_lowercase();
    options
        .iter()
        .find(|option| lowered.contains(&option.to_lowercase()))
        .map(|option| (*option).to_string())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn test_fn_node_runs() {
        let node = FnNode::new(|state: PipelineState| async move {
            StateUpdate::new().set("echo", state.text("topic").to_string())
        });

        let state = PipelineState::new().with_field("topic", "borrowck");
        let update = node.run(&state).await;
        let merged = state.merge(update);
        assert_eq!(merged.text("echo"), "borrowck");
    }

    const OPTIONS: &[&str] = &["retrieve", "pretest", "direct"];

    #[rstest]
    #[case("retrieve", "retrieve")]
    #[case("I would use the RETRIEVE path here.", "retrieve")]
    #[case("pretest first, then generate", "pretest")]
    #[case("direct", "direct")]
    #[case("definitely something else", "direct")]
    #[case("", "direct")]
    fn test_clamp_decision(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clamp_decision(raw, OPTIONS, "direct"), expected);
    }

    #[test]
    fn test_clamp_priority_is_declared_order() {
        // Both options appear; the earlier declared one wins.
        assert_eq!(
            clamp_decision("retrieve or pretest, unsure", OPTIONS, "direct"),
            "retrieve"
        );
    }
}
