//! Content authoring pipeline: plan → write_modules → assemble.
//!
//! Breaks a topic into module titles, drafts each module, and stitches the
//! drafts into one curriculum. Planning failures degrade to a single-module
//! plan for the raw topic; a failed draft leaves an empty slot and an error
//! entry rather than sinking the remaining modules.

use crate::deps::PipelineDeps;
use crate::parse::parse_title_list;
use async_trait::async_trait;
use courseloom_core::GenerationSettings;
use courseloom_graph::{GraphBuilder, GraphResult, Node, PipelineGraph, PipelineState, StateUpdate, END};
use serde_json::{Map, Value};

struct PlanNode {
    deps: PipelineDeps,
}

#[async_trait]
impl Node for PlanNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let topic = state.text("topic");
        let prompt = format!(
            "You are an expert curriculum planner. Break down the topic '{topic}' \
             into 3-6 course module titles. Return ONLY a JSON list of strings."
        );
        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.4).max_tokens(1024));

        let fallback_plan = vec![topic.to_string()];
        match self.deps.primary.invoke(&prompt, &settings).await {
            Ok(text) => match parse_title_list(&text) {
                Ok(titles) => StateUpdate::new().set("modules", titles),
                Err(err) => StateUpdate::new()
                    .set("modules", fallback_plan)
                    .error("plan", err.to_string()),
            },
            Err(err) => StateUpdate::new()
                .set("modules", fallback_plan)
                .error("plan", err.to_string()),
        }
    }
}

struct WriteModulesNode {
    deps: PipelineDeps,
}

#[async_trait]
impl Node for WriteModulesNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let mut drafts: Map<String, Value> = state
            .get("drafts")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.6).max_tokens(4096));

        let mut update = StateUpdate::new();
        for title in state.list("modules") {
            let already_written = drafts
                .get(&title)
                .and_then(Value::as_str)
                .is_some_and(|draft| !draft.is_empty());
            if already_written {
                continue;
            }

            let prompt = format!(
                "You are an instructional designer. Create a detailed training module \
                 for '{title}' with:\n\
                 1) An engaging introduction\n\
                 2) 3-5 learning objectives\n\
                 3) 2-4 main sections with concrete examples\n\
                 4) A concise summary"
            );
            match self.deps.primary.invoke(&prompt, &settings).await {
                Ok(text) => {
                    drafts.insert(title, Value::String(text));
                }
                Err(err) => {
                    drafts.insert(title.clone(), Value::String(String::new()));
                    update = update.error("write_modules", format!("'{title}': {err}"));
                }
            }
        }

        update.set("drafts", Value::Object(drafts))
    }
}

struct AssembleNode {
    deps: PipelineDeps,
}

#[async_trait]
impl Node for AssembleNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let topic = state.text("topic");
        let drafts = state.get("drafts").and_then(Value::as_object);
        let joined = state
            .list("modules")
            .iter()
            .map(|title| {
                let draft = drafts
                    .and_then(|map| map.get(title))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                format!("### {title}\n{draft}")
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Combine the following modules into a cohesive curriculum on '{topic}'. \
             Ensure smooth progression, avoid duplication, and add transitional notes \
             between modules where helpful.\n\n{joined}"
        );
        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.2).max_tokens(4096));

        match self.deps.primary.invoke(&prompt, &settings).await {
            Ok(text) => StateUpdate::new().set("final", text),
            Err(err) => StateUpdate::new().error("assemble", err.to_string()),
        }
    }
}

/// Build the content authoring graph.
///
/// # Errors
///
/// Returns a [`courseloom_graph::GraphError`] if the definition is invalid.
pub fn graph(deps: PipelineDeps) -> GraphResult<PipelineGraph> {
    GraphBuilder::new()
        .name("content")
        .node("plan", PlanNode { deps: deps.clone() })
        .node("write_modules", WriteModulesNode { deps: deps.clone() })
        .node("assemble", AssembleNode { deps })
        .entry("plan")
        .edge("plan", "write_modules")
        .edge("write_modules", "assemble")
        .edge("assemble", END)
        .build()
}
