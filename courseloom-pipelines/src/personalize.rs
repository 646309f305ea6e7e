//! Personalization pipeline: classify → {retrieve | pretest | direct} → draft → review.
//!
//! A decision node picks the best path for a personalized module: pull the
//! learner's known weak areas from the store, run a quick pretest first, or
//! generate directly. The raw classifier text is clamped to the closed
//! decision set before it ever reaches edge resolution.

use crate::deps::PipelineDeps;
use async_trait::async_trait;
use courseloom_core::GenerationSettings;
use courseloom_graph::{
    clamp_decision, GraphBuilder, GraphResult, Node, PipelineGraph, PipelineState, StateUpdate, END,
};
use serde_json::Value;

/// Closed decision set for the classify step, in clamp priority order.
pub const DECISIONS: &[&str] = &["retrieve", "pretest", "direct"];

struct ClassifyNode {
    deps: PipelineDeps,
}

#[async_trait]
impl Node for ClassifyNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let topic = state.text("topic");
        let role = state.text("user_role");
        let prompt = format!(
            "Decide the best path for personalized module creation.\n\
             Options:\n\
             - retrieve: use stored weakness history to target remediation\n\
             - pretest: create a 3-question quick pretest to assess gaps first\n\
             - direct: directly generate the module without extra steps\n\
             Return only one word: retrieve, pretest, or direct.\n\n\
             Topic: {topic}\nRole: {role}"
        );
        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.2).max_tokens(64));

        match self.deps.primary.invoke(&prompt, &settings).await {
            Ok(text) => {
                StateUpdate::new().set("decision", clamp_decision(&text, DECISIONS, "direct"))
            }
            Err(err) => StateUpdate::new()
                .set("decision", "direct")
                .error("classify", err.to_string()),
        }
    }
}

struct RetrieveNode {
    deps: PipelineDeps,
}

#[async_trait]
impl Node for RetrieveNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let user_id = state.text("user_id");
        let key = format!("weaknesses:{user_id}");

        let notes = match self.deps.store.get(&key).await {
            Ok(value) => collect_notes(&value),
            Err(err) if err.is_not_found() => {
                // No history is not a degradation; there is just nothing to
                // target.
                return StateUpdate::new().set("weaknesses", "");
            }
            Err(err) => {
                return StateUpdate::new()
                    .set("weaknesses", "")
                    .error("retrieve", err.to_string());
            }
        };

        if notes.is_empty() {
            return StateUpdate::new().set("weaknesses", "");
        }

        let prompt = format!(
            "Summarize the learner's known weak areas into one short paragraph \
             a module author can target:\n- {}",
            notes.join("\n- ")
        );
        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.2).max_tokens(512));

        match self.deps.primary.invoke(&prompt, &settings).await {
            Ok(summary) => StateUpdate::new().set("weaknesses", summary),
            Err(err) => StateUpdate::new()
                .set("weaknesses", "")
                .error("retrieve", err.to_string()),
        }
    }
}

fn collect_notes(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

struct PretestNode {
    deps: PipelineDeps,
}

#[async_trait]
impl Node for PretestNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let prompt = format!(
            "Create a short pretest of 3 questions to quickly assess user knowledge \
             on the topic below. Include an answer key.\n\n\
             Topic: {}\nRole: {}",
            state.text("topic"),
            state.text("user_role")
        );
        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.3).max_tokens(800));

        match self.deps.primary.invoke(&prompt, &settings).await {
            Ok(pretest) => StateUpdate::new().set("pretest", pretest),
            Err(err) => StateUpdate::new()
                .set("pretest", "")
                .error("pretest", err.to_string()),
        }
    }
}

struct DraftNode {
    deps: PipelineDeps,
}

#[async_trait]
impl Node for DraftNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let mut prompt = format!(
            "You are a corporate training designer. Create a module on '{}' for \
             role '{}'.\n\
             Structure: introduction, 3-5 objectives, 2-4 sections with \
             examples/exercises, and a summary.\n\
             Tone: clear, practical, role-relevant.\n",
            state.text("topic"),
            state.text("user_role")
        );
        let weaknesses = state.text("weaknesses");
        if !weaknesses.is_empty() {
            prompt.push_str(&format!(
                "\nFocus remediation on these known weak areas: {weaknesses}\n"
            ));
        }

        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.6).max_tokens(2048));

        match self.deps.primary.invoke(&prompt, &settings).await {
            Ok(draft) => {
                let pretest = state.text("pretest");
                let draft = if pretest.is_empty() {
                    draft
                } else {
                    format!("## Pretest\n{pretest}\n\n## Module\n{draft}")
                };
                StateUpdate::new().set("draft", draft)
            }
            Err(err) => StateUpdate::new()
                .set("draft", "")
                .error("draft", err.to_string()),
        }
    }
}

struct ReviewNode {
    deps: PipelineDeps,
}

const REQUIRED_SECTIONS: &[&str] = &["introduction", "objectives", "summary"];

#[async_trait]
impl Node for ReviewNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let draft = state.text("draft");
        let lowered = draft.to_lowercase();
        let missing: Vec<&str> = REQUIRED_SECTIONS
            .iter()
            .copied()
            .filter(|section| !lowered.contains(section))
            .collect();

        if missing.is_empty() {
            return StateUpdate::new();
        }

        let prompt = format!(
            "Add an addendum ensuring the draft includes or clarifies these \
             missing sections: {}",
            missing.join(", ")
        );
        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.2).max_tokens(400));

        match self.deps.primary.invoke(&prompt, &settings).await {
            Ok(addendum) => {
                StateUpdate::new().set("draft", format!("{draft}\n\n## Addendum\n{addendum}"))
            }
            Err(err) => StateUpdate::new().error("review", err.to_string()),
        }
    }
}

/// Build the personalization graph.
///
/// # Errors
///
/// Returns a [`courseloom_graph::GraphError`] if the definition is invalid.
pub fn graph(deps: PipelineDeps) -> GraphResult<PipelineGraph> {
    GraphBuilder::new()
        .name("personalize")
        .node("classify", ClassifyNode { deps: deps.clone() })
        .node("retrieve", RetrieveNode { deps: deps.clone() })
        .node("pretest", PretestNode { deps: deps.clone() })
        .node("draft", DraftNode { deps: deps.clone() })
        .node("review", ReviewNode { deps })
        .entry("classify")
        .decision("decision", DECISIONS)
        .branch(
            "classify",
            "decision",
            &[
                ("retrieve", "retrieve"),
                ("pretest", "pretest"),
                ("direct", "draft"),
            ],
        )
        .edge("retrieve", "draft")
        .edge("pretest", "draft")
        .edge("draft", "review")
        .edge("review", END)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseloom_core::{InMemoryStore, Store};
    use courseloom_providers::{MockProvider, ProviderError};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    const COMPLETE_DRAFT: &str =
        "Introduction\nObjectives: learn things\nSections\nSummary: done";

    fn state() -> PipelineState {
        PipelineState::new()
            .with_field("topic", "api security")
            .with_field("user_id", "u-7")
            .with_field("user_role", "backend engineer")
    }

    #[tokio::test]
    async fn test_direct_path() {
        // Scenario: classify decides direct; route skips straight to draft.
        let provider = MockProvider::new("m")
            .with_text("direct")
            .with_text(COMPLETE_DRAFT);

        let deps = PipelineDeps::new(Arc::new(provider), Arc::new(InMemoryStore::new()));
        let report = graph(deps).unwrap().run(state()).await;

        assert!(report.is_success());
        assert!(report.state.errors().is_empty());
        assert_eq!(report.path, vec!["classify", "draft", "review"]);
        assert!(!report.state.text("draft").is_empty());
        assert!(!report.state.contains("weaknesses"));
    }

    #[tokio::test]
    async fn test_retrieve_path_summarizes_history() {
        let provider = MockProvider::new("m")
            .with_text("retrieve")
            .with_text("weak on authentication flows")
            .with_text(COMPLETE_DRAFT);
        let handle = provider.clone();

        let store = InMemoryStore::new();
        store
            .put("weaknesses:u-7", json!(["confused OAuth scopes", "missed rate limits"]))
            .await
            .unwrap();

        let deps = PipelineDeps::new(Arc::new(provider), Arc::new(store));
        let report = graph(deps).unwrap().run(state()).await;

        assert!(report.is_success());
        assert_eq!(report.path, vec!["classify", "retrieve", "draft", "review"]);
        assert_eq!(report.state.text("weaknesses"), "weak on authentication flows");
        // The draft prompt carries the remediation focus.
        assert!(handle.recorded_prompts()[2].contains("weak on authentication flows"));
    }

    #[tokio::test]
    async fn test_retrieve_provider_failure_degrades() {
        // Scenario: the retrieve step's provider call fails; the run still
        // reaches the terminal node with an empty (not missing) weaknesses
        // field and a tagged error entry.
        let provider = MockProvider::new("m")
            .with_text("retrieve")
            .with_error(ProviderError::Timeout(std::time::Duration::from_secs(30)))
            .with_text(COMPLETE_DRAFT);

        let store = InMemoryStore::new();
        store.put("weaknesses:u-7", json!(["something"])).await.unwrap();

        let deps = PipelineDeps::new(Arc::new(provider), Arc::new(store));
        let report = graph(deps).unwrap().run(state()).await;

        assert!(report.is_success());
        assert_eq!(report.state.errors().len(), 1);
        assert_eq!(report.state.errors()[0].step, "retrieve");
        assert!(report.state.contains("weaknesses"));
        assert_eq!(report.state.text("weaknesses"), "");
        assert_eq!(*report.path.last().unwrap(), "review");
    }

    #[tokio::test]
    async fn test_retrieve_with_no_history_is_clean() {
        let provider = MockProvider::new("m")
            .with_text("retrieve")
            .with_text(COMPLETE_DRAFT);

        let deps = PipelineDeps::new(Arc::new(provider), Arc::new(InMemoryStore::new()));
        let report = graph(deps).unwrap().run(state()).await;

        assert!(report.is_success());
        assert!(report.state.errors().is_empty());
        assert_eq!(report.state.text("weaknesses"), "");
    }

    #[tokio::test]
    async fn test_pretest_path_prepends_pretest() {
        let provider = MockProvider::new("m")
            .with_text("pretest")
            .with_text("Q1? Q2? Q3? Answers: ...")
            .with_text(COMPLETE_DRAFT);

        let deps = PipelineDeps::new(Arc::new(provider), Arc::new(InMemoryStore::new()));
        let report = graph(deps).unwrap().run(state()).await;

        assert!(report.is_success());
        assert_eq!(report.path, vec!["classify", "pretest", "draft", "review"]);
        assert!(report.state.text("draft").starts_with("## Pretest"));
    }

    #[tokio::test]
    async fn test_ambiguous_classification_defaults_to_direct() {
        let provider = MockProvider::new("m")
            .with_text("hmm, that depends on many factors")
            .with_text(COMPLETE_DRAFT);

        let deps = PipelineDeps::new(Arc::new(provider), Arc::new(InMemoryStore::new()));
        let report = graph(deps).unwrap().run(state()).await;

        assert!(report.is_success());
        assert_eq!(report.state.text("decision"), "direct");
        assert_eq!(report.path, vec!["classify", "draft", "review"]);
    }

    #[tokio::test]
    async fn test_review_appends_addendum_for_missing_sections() {
        let provider = MockProvider::new("m")
            .with_text("direct")
            .with_text("just some body text with no structure")
            .with_text("addendum covering introduction, objectives, summary");

        let deps = PipelineDeps::new(Arc::new(provider), Arc::new(InMemoryStore::new()));
        let report = graph(deps).unwrap().run(state()).await;

        assert!(report.is_success());
        assert!(report.state.text("draft").contains("## Addendum"));
    }
}
