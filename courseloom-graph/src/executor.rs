//! Graph execution.
//!
//! One run per inbound request, strictly sequential: execute the current
//! node, merge its update, resolve the next node from the edge tables, stop
//! at `END`. Node failures never unwind through the executor; they live in
//! the state's error list, so the only abnormal termination is the caller's
//! deadline elapsing.

use crate::edge::{Target, Transition};
use crate::error::ExecuteError;
use crate::graph::PipelineGraph;
use crate::state::{PipelineState, StateUpdate};
use courseloom_core::generate_run_id;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Overall deadline for the run.
    pub deadline: Option<Duration>,
    /// Hard step bound; validated graphs are acyclic and never reach it.
    pub max_steps: u32,
    /// Custom run ID; generated when unset.
    pub run_id: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            deadline: None,
            max_steps: 100,
            run_id: None,
        }
    }
}

impl RunOptions {
    /// Create default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overall deadline.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the maximum step count.
    #[must_use]
    pub fn max_steps(mut self, max: u32) -> Self {
        self.max_steps = max;
        self
    }

    /// Set a custom run ID.
    #[must_use]
    pub fn run_id(mut self, id: impl Into<String>) -> Self {
        self.run_id = Some(id.into());
        self
    }
}

/// The outcome of a pipeline run.
///
/// Always carries the final state; callers inspect [`RunReport::failed_step`]
/// before treating a run as successful, and the state's error list for
/// degraded sections of an otherwise successful run.
#[derive(Debug)]
pub struct RunReport {
    /// Final merged state.
    pub state: PipelineState,
    /// Node names in visit order.
    pub path: Vec<String>,
    /// Number of nodes executed.
    pub steps: u32,
    /// Run identifier.
    pub run_id: String,
    /// Set when a pipeline-critical step failed.
    pub failed_step: Option<String>,
}

impl RunReport {
    /// Whether the run completed without a pipeline-critical failure.
    ///
    /// A successful run may still have degraded steps in the state's error
    /// list.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_step.is_none()
    }
}

impl PipelineGraph {
    /// Run the graph to completion.
    ///
    /// Never fails: all step-level trouble is inside the returned report.
    pub async fn run(&self, state: PipelineState) -> RunReport {
        self.walk(state, RunOptions::default()).await
    }

    /// Run the graph with options.
    ///
    /// # Errors
    ///
    /// Returns [`ExecuteError::DeadlineExceeded`] when the configured
    /// deadline elapses while the run is still in flight (typically blocked
    /// on a provider call). The partial state is discarded; it was never
    /// durable.
    pub async fn run_with_options(
        &self,
        state: PipelineState,
        options: RunOptions,
    ) -> Result<RunReport, ExecuteError> {
        match options.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.walk(state, options))
                .await
                .map_err(|_| ExecuteError::DeadlineExceeded(deadline)),
            None => Ok(self.walk(state, options).await),
        }
    }

    async fn walk(&self, mut state: PipelineState, options: RunOptions) -> RunReport {
        let run_id = options.run_id.unwrap_or_else(generate_run_id);
        info!(
            graph = self.name().unwrap_or("unnamed"),
            run_id = %run_id,
            "starting pipeline run"
        );

        let mut current = self.entry().to_string();
        let mut path = Vec::new();
        let mut steps = 0u32;
        let mut failed_step: Option<String> = None;

        loop {
            steps += 1;
            if steps > options.max_steps {
                state = state.merge(StateUpdate::new().error(
                    "executor",
                    format!("maximum steps exceeded: {}", options.max_steps),
                ));
                failed_step = Some(current);
                break;
            }

            // Validation guarantees every routed name is registered.
            let Some(node) = self.node(&current) else {
                state = state.merge(
                    StateUpdate::new().error("executor", format!("node not found: {current}")),
                );
                failed_step = Some(current);
                break;
            };

            path.push(current.clone());
            debug!(node = %current, step = steps, run_id = %run_id, "running node");

            let update = node.run(&state).await;
            if let Some(step) = update.failed_step() {
                failed_step = Some(step.to_string());
            }

            let errors_before = state.errors().len();
            state = state.merge(update);
            if state.errors().len() > errors_before {
                warn!(node = %current, run_id = %run_id, "node recorded degraded steps");
            }

            if failed_step.is_some() {
                break;
            }

            match self.transition_for(&current) {
                None | Some(Transition::Direct(Target::End)) => break,
                Some(Transition::Direct(Target::Node(next))) => current = next.clone(),
                Some(Transition::Branch { field, table }) => {
                    let value = state.text(field).to_string();
                    match table.get(&value) {
                        Some(Target::End) => break,
                        Some(Target::Node(next)) => current = next.clone(),
                        None => {
                            // Out-of-enumeration value written by a node that
                            // bypassed clamping. Not raisable per the
                            // propagation policy; record and stop.
                            state = state.merge(StateUpdate::new().error(
                                &current,
                                format!("unroutable decision value '{value}' for field '{field}'"),
                            ));
                            failed_step = Some(current);
                            break;
                        }
                    }
                }
            }
        }

        info!(
            run_id = %run_id,
            steps,
            degraded = state.errors().len(),
            failed = failed_step.as_deref().unwrap_or(""),
            "pipeline run finished"
        );

        RunReport {
            state,
            path,
            steps,
            run_id,
            failed_step,
        }
    }
}
