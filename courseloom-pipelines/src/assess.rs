//! Assessment pipeline: a single template-driven generation step.
//!
//! Produces a quiz, scenario exercise, or fill-in-the-blanks sheet from
//! source content. Unknown assessment kinds clamp to multiple choice instead
//! of leaking free text into template selection.

use crate::deps::PipelineDeps;
use async_trait::async_trait;
use courseloom_core::GenerationSettings;
use courseloom_graph::{GraphBuilder, GraphResult, Node, PipelineGraph, PipelineState, StateUpdate, END};

/// Supported assessment kinds; the first entry is the clamp default.
pub const KINDS: &[&str] = &["multiple_choice", "scenario", "fill_in_the_blanks"];

fn template_for(kind: &str) -> &'static str {
    match kind {
        "scenario" => {
            "You are an expert in instructional design. Based on the content below, \
             create a realistic workplace scenario that tests practical \
             decision-making.\n\
             - The scenario should be detailed and plausible.\n\
             - After the scenario, ask a single, clear question about the best next \
             action.\n\
             - Provide an 'Ideal Answer' section with justification referencing the \
             content.\n\n\
             Content:\n---\n{content}\n---"
        }
        "fill_in_the_blanks" => {
            "You are a meticulous editor. From the key concepts in the content below, \
             create 5 fill-in-the-blanks items.\n\
             - Each item is a complete sentence with a single blank '____'.\n\
             - The sentences should test important definitions or process steps.\n\
             - Provide a separate, clearly labeled answer key.\n\n\
             Content:\n---\n{content}\n---"
        }
        _ => {
            "You are an expert quiz designer. Based on the content below, create a \
             5-question multiple-choice quiz.\n\
             - Each question must have 4 options (A, B, C, D).\n\
             - Only one option is correct; clearly mark the correct choice in an \
             answer key at the end.\n\n\
             Content:\n---\n{content}\n---"
        }
    }
}

struct GenerateNode {
    deps: PipelineDeps,
}

#[async_trait]
impl Node for GenerateNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let requested = state.text("assessment_type");
        let kind = if KINDS.contains(&requested) {
            requested
        } else {
            KINDS[0]
        };

        let prompt = template_for(kind).replace("{content}", state.text("content"));
        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.5).max_tokens(2048));

        match self.deps.primary.invoke(&prompt, &settings).await {
            Ok(assessment) => StateUpdate::new()
                .set("assessment", assessment)
                .set("assessment_type", kind.to_string()),
            Err(err) => StateUpdate::new()
                .set("assessment", "")
                .error("generate", err.to_string()),
        }
    }
}

/// Build the assessment graph.
///
/// # Errors
///
/// Returns a [`courseloom_graph::GraphError`] if the definition is invalid.
pub fn graph(deps: PipelineDeps) -> GraphResult<PipelineGraph> {
    GraphBuilder::new()
        .name("assess")
        .node("generate", GenerateNode { deps })
        .entry("generate")
        .edge("generate", END)
        .build()
}
