//! Localization pipeline: translate → review → finalize.
//!
//! Translates source text into a target language with optional glossary
//! enforcement and locale adaptation, quality-checks the draft, and settles
//! the output with a deterministic precedence rule: a corrected version
//! written by the review step wins; otherwise the plain draft is final.

use crate::deps::PipelineDeps;
use async_trait::async_trait;
use courseloom_core::GenerationSettings;
use courseloom_graph::{GraphBuilder, GraphResult, Node, PipelineGraph, PipelineState, StateUpdate, END};
use serde_json::Value;

struct TranslateNode {
    deps: PipelineDeps,
}

#[async_trait]
impl Node for TranslateNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let target = state.text("target_language");
        let style = match state.text("style") {
            "" => "neutral",
            other => other,
        };
        let glossary_note = glossary_json(state)
            .map(|glossary| format!("Enforce glossary terms exactly: {glossary}"))
            .unwrap_or_default();
        let locale_note = if state.get("localize").and_then(Value::as_bool).unwrap_or(false) {
            format!("Adapt for {target} locale (currencies, dates, idioms).")
        } else {
            String::new()
        };

        let prompt = format!(
            "You are a professional translator.\n\
             Target language: {target}\n\
             Style: {style}\n\
             {locale_note}\n{glossary_note}\n\n\
             Translate the following text. Respond with only the translation:\n\
             ---\n{}\n---",
            state.text("text")
        );
        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.2).max_tokens(2048));

        match self.deps.primary.invoke(&prompt, &settings).await {
            Ok(draft) => StateUpdate::new().set("draft", draft),
            Err(err) => StateUpdate::new()
                .set("draft", "")
                .error("translate", err.to_string()),
        }
    }
}

fn glossary_json(state: &PipelineState) -> Option<String> {
    let glossary = state.get("glossary")?.as_object()?;
    if glossary.is_empty() {
        return None;
    }
    serde_json::to_string(glossary).ok()
}

struct ReviewNode {
    deps: PipelineDeps,
}

#[async_trait]
impl Node for ReviewNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let draft = state.text("draft");
        let glossary = glossary_json(state).unwrap_or_else(|| "{}".to_string());
        let prompt = format!(
            "Quality-check the translation against these criteria:\n\
             - All required glossary terms present and correctly applied.\n\
             - No untranslated phrases or source-language artifacts remain.\n\
             - Style and tone match the requested style.\n\n\
             Glossary (if any): {glossary}\n\n\
             If issues exist, respond with a corrected version; otherwise reply 'OK'.\n\n\
             Translation to check:\n---\n{draft}\n---"
        );
        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.1).max_tokens(2048));

        match self.deps.primary.invoke(&prompt, &settings).await {
            Ok(notes) => {
                if notes.trim().to_lowercase().starts_with("ok") {
                    StateUpdate::new().set("qa_notes", "OK")
                } else {
                    // The corrected version takes precedence over the draft.
                    StateUpdate::new()
                        .set("qa_notes", notes.clone())
                        .set("final", notes)
                }
            }
            Err(err) => StateUpdate::new()
                .set("qa_notes", "")
                .error("review", err.to_string()),
        }
    }
}

struct FinalizeNode;

#[async_trait]
impl Node for FinalizeNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        // An explicit `final` written by the review path wins; only fill from
        // the draft when review left it empty.
        if state.text("final").is_empty() {
            StateUpdate::new().set("final", state.text("draft").to_string())
        } else {
            StateUpdate::new()
        }
    }
}

/// Build the localization graph.
///
/// # Errors
///
/// Returns a [`courseloom_graph::GraphError`] if the definition is invalid.
pub fn graph(deps: PipelineDeps) -> GraphResult<PipelineGraph> {
    GraphBuilder::new()
        .name("localize")
        .node("translate", TranslateNode { deps: deps.clone() })
        .node("review", ReviewNode { deps })
        .node("finalize", FinalizeNode)
        .entry("translate")
        .edge("translate", "review")
        .edge("review", "finalize")
        .edge("finalize", END)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseloom_core::InMemoryStore;
    use courseloom_providers::{MockProvider, ProviderError};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn deps_with(provider: MockProvider) -> PipelineDeps {
        PipelineDeps::new(Arc::new(provider), Arc::new(InMemoryStore::new()))
    }

    fn state() -> PipelineState {
        PipelineState::new()
            .with_field("text", "Welcome to the onboarding course.")
            .with_field("target_language", "German")
    }

    #[tokio::test]
    async fn test_clean_review_finalizes_draft() {
        let provider = MockProvider::new("m")
            .with_text("Willkommen zum Einarbeitungskurs.")
            .with_text("OK");

        let report = graph(deps_with(provider)).unwrap().run(state()).await;

        assert!(report.is_success());
        assert_eq!(report.state.text("qa_notes"), "OK");
        assert_eq!(report.state.text("final"), "Willkommen zum Einarbeitungskurs.");
    }

    #[tokio::test]
    async fn test_correction_takes_precedence_over_draft() {
        let provider = MockProvider::new("m")
            .with_text("rough draft translation")
            .with_text("Corrected: polished translation");

        let report = graph(deps_with(provider)).unwrap().run(state()).await;

        assert!(report.is_success());
        assert_eq!(report.state.text("final"), "Corrected: polished translation");
        assert_ne!(report.state.text("final"), report.state.text("draft"));
    }

    #[tokio::test]
    async fn test_glossary_reaches_the_prompt() {
        let provider = MockProvider::new("m").with_text("draft").with_text("OK");
        let handle = provider.clone();

        let report = graph(deps_with(provider))
            .unwrap()
            .run(state().with_field("glossary", json!({"course": "Kurs"})))
            .await;

        assert!(report.is_success());
        assert!(handle.recorded_prompts()[0].contains("Kurs"));
    }

    #[tokio::test]
    async fn test_review_failure_keeps_draft_as_final() {
        let provider = MockProvider::new("m")
            .with_text("the draft")
            .with_error(ProviderError::http(503, "unavailable"));

        let report = graph(deps_with(provider)).unwrap().run(state()).await;

        assert!(report.is_success());
        assert_eq!(report.state.errors().len(), 1);
        assert_eq!(report.state.errors()[0].step, "review");
        // Finalize falls back to the draft when review degraded.
        assert_eq!(report.state.text("final"), "the draft");
    }
}
