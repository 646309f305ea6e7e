//! Pipeline state: the mergeable record flowing through a run.
//!
//! [`PipelineState`] maps field names to JSON values and carries an
//! append-only list of [`StepError`] entries. Nodes never mutate the state
//! they read; they return a [`StateUpdate`] the executor merges in whole-field
//! replacements, except for errors, which only ever accumulate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A degraded step recorded in the state's error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    /// The step that degraded.
    pub step: String,
    /// What went wrong.
    pub message: String,
}

impl StepError {
    /// Create a new error entry.
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// The state container for one pipeline run.
///
/// Created from caller inputs, mutated only through [`PipelineState::merge`],
/// and discarded when the run returns. Reading a missing field yields a
/// default (empty string, empty list), never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    fields: IndexMap<String, Value>,
    errors: Vec<StepError>,
}

impl PipelineState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input field (builder style, for the initial state).
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field's raw value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Read a field as text; missing or non-string fields read as `""`.
    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Read a field as a list of strings; missing fields read as empty.
    #[must_use]
    pub fn list(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether a field has been written.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The accumulated error list.
    #[must_use]
    pub fn errors(&self) -> &[StepError] {
        &self.errors
    }

    /// Whether any step degraded so far.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Merge a partial update into this state.
    ///
    /// Fields are replaced wholesale (unknown fields are added); error
    /// entries are appended, never removed. Merging cannot fail.
    #[must_use]
    pub fn merge(mut self, update: StateUpdate) -> Self {
        for (name, value) in update.fields {
            self.fields.insert(name, value);
        }
        self.errors.extend(update.errors);
        self
    }
}

/// The partial record a node returns.
///
/// Collects field overwrites, error entries, and (for pipeline-critical
/// failures) a fatal marker the executor surfaces as the run's failed step.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    fields: IndexMap<String, Value>,
    errors: Vec<StepError>,
    failed_step: Option<String>,
}

impl StateUpdate {
    /// Create an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a field.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Record a degraded step.
    #[must_use]
    pub fn error(mut self, step: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.push(StepError::new(step, message));
        self
    }

    /// Record a pipeline-critical failure.
    ///
    /// Appends the error entry and marks the run as failed at `step`; the
    /// executor stops the walk and reports the step in its run report.
    #[must_use]
    pub fn fail(mut self, step: impl Into<String>, message: impl Into<String>) -> Self {
        let step = step.into();
        self.failed_step = Some(step.clone());
        self.errors.push(StepError::new(step, message));
        self
    }

    /// The fatal marker, if any.
    #[must_use]
    pub fn failed_step(&self) -> Option<&str> {
        self.failed_step.as_deref()
    }

    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.errors.is_empty() && self.failed_step.is_none()
    }
}
