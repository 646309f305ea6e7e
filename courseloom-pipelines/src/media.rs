//! Multimedia pipeline: route → {illustrate | summarize}.
//!
//! Routes on the inputs present: a prompt means an illustration request, a
//! transcript means summarization. Illustration runs a three-tier fallback
//! ladder (primary model and secondary model each followed by a render step
//! that can fail on bad markup, then a placeholder backend that cannot fail)
//! and stores the winning artifact.

use crate::deps::PipelineDeps;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use courseloom_core::identifier::generate_artifact_id;
use courseloom_core::GenerationSettings;
use courseloom_graph::{GraphBuilder, GraphResult, Node, PipelineGraph, PipelineState, StateUpdate, END};
use courseloom_providers::{FallbackChain, TemplateProvider, Tier};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Closed routing set for the media pipeline.
pub const MODES: &[&str] = &["illustrate", "summarize"];

/// 1x1 transparent PNG, the placeholder tier's artifact.
const PLACEHOLDER_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR4nGNgYAAAAAMAASsJTYQAAAAASUVORK5CYII=";

/// A rendered image artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// MIME type of the encoding.
    pub media_type: &'static str,
}

/// Render diagram markup into a concrete SVG artifact.
///
/// The markup dialect is one `from -> to` edge per line; anything without at
/// least one edge is unusable and fails the tier, independent of whether
/// generation itself succeeded.
pub fn render_diagram(markup: String) -> Result<ImageArtifact, String> {
    let edges: Vec<(&str, &str)> = markup
        .lines()
        .filter_map(|line| line.split_once("->"))
        .map(|(from, to)| (from.trim(), to.trim()))
        .filter(|(from, to)| !from.is_empty() && !to.is_empty())
        .collect();

    if edges.is_empty() {
        return Err("no edges in diagram markup".to_string());
    }

    let mut svg = String::from(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"640\" height=\"480\">",
    );
    for (index, (from, to)) in edges.iter().enumerate() {
        let y = 30 + index * 40;
        svg.push_str(&format!(
            "<text x=\"20\" y=\"{y}\">{from} \u{2192} {to}</text>"
        ));
    }
    svg.push_str("</svg>");

    Ok(ImageArtifact {
        bytes: svg.into_bytes(),
        media_type: "image/svg+xml",
    })
}

fn placeholder_artifact(_text: String) -> Result<ImageArtifact, String> {
    BASE64
        .decode(PLACEHOLDER_PNG)
        .map(|bytes| ImageArtifact {
            bytes,
            media_type: "image/png",
        })
        .map_err(|err| err.to_string())
}

struct RouteNode;

#[async_trait]
impl Node for RouteNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        if !state.text("prompt").is_empty() {
            StateUpdate::new().set("mode", "illustrate")
        } else if !state.text("source_text").is_empty() {
            StateUpdate::new().set("mode", "summarize")
        } else {
            // Nothing to work on: no artifact can come out of this run.
            StateUpdate::new().fail("route", "no prompt or source text provided")
        }
    }
}

struct IllustrateNode {
    deps: PipelineDeps,
}

impl IllustrateNode {
    fn chain(&self) -> FallbackChain<ImageArtifact> {
        let mut chain = FallbackChain::new().tier(
            Tier::new("primary", Arc::clone(&self.deps.primary), render_diagram)
                .with_settings(GenerationSettings::new().temperature(0.2).max_tokens(1024)),
        );
        if let Some(secondary) = &self.deps.secondary {
            chain = chain.tier(
                Tier::new("secondary", Arc::clone(secondary), render_diagram)
                    .with_settings(GenerationSettings::new().temperature(0.2).max_tokens(1024)),
            );
        }
        chain.tier(Tier::new(
            "placeholder",
            Arc::new(TemplateProvider::echo("placeholder")),
            placeholder_artifact,
        ))
    }
}

#[async_trait]
impl Node for IllustrateNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let prompt = format!(
            "Describe a diagram for the following request as simple markup, one \
             'from -> to' edge per line, nothing else.\n\nRequest: {}",
            state.text("prompt")
        );

        let resolved = match self.chain().resolve(&prompt, &self.deps.settings).await {
            Ok(resolved) => resolved,
            Err(exhausted) => {
                // A required step with no artifact left to produce.
                return StateUpdate::new().fail("illustrate", exhausted.to_string());
            }
        };

        debug!(
            tier = %resolved.tier,
            failed_attempts = resolved.attempts.len(),
            "illustration resolved"
        );

        let artifact_id = generate_artifact_id();
        let record = json!({
            "media_type": resolved.artifact.media_type,
            "data_b64": BASE64.encode(&resolved.artifact.bytes),
            "tier": resolved.tier,
        });
        match self.deps.store.put(&artifact_id, record).await {
            Ok(media_id) => StateUpdate::new()
                .set("media_id", media_id)
                .set("media_type", resolved.artifact.media_type),
            Err(err) => StateUpdate::new()
                .set("media_id", "")
                .error("illustrate", format!("artifact store failed: {err}")),
        }
    }
}

struct SummarizeNode {
    deps: PipelineDeps,
}

#[async_trait]
impl Node for SummarizeNode {
    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let format_type = match state.text("format") {
            "" => "paragraph",
            other => other,
        };
        let length_desc = match state.text("length") {
            "short" => "one concise paragraph",
            "long" => "a detailed summary with an introduction, key findings, and a conclusion",
            _ => "a bulleted list of 3-5 key points",
        };

        let prompt = format!(
            "You are a professional summarizer.\n\n\
             Summarize the input text into a {format_type} with {length_desc}.\n\n\
             Text:\n---\n{}\n---\n\
             Respond with only the summary.",
            state.text("source_text")
        );
        let settings = self
            .deps
            .step_settings(&GenerationSettings::new().temperature(0.3).max_tokens(2048));

        match self.deps.primary.invoke(&prompt, &settings).await {
            Ok(summary) => StateUpdate::new().set("summary", summary),
            Err(err) => StateUpdate::new()
                .set("summary", "")
                .error("summarize", err.to_string()),
        }
    }
}

/// Build the multimedia graph.
///
/// # Errors
///
/// Returns a [`courseloom_graph::GraphError`] if the definition is invalid.
pub fn graph(deps: PipelineDeps) -> GraphResult<PipelineGraph> {
    GraphBuilder::new()
        .name("media")
        .node("route", RouteNode)
        .node("illustrate", IllustrateNode { deps: deps.clone() })
        .node("summarize", SummarizeNode { deps })
        .entry("route")
        .decision("mode", MODES)
        .branch(
            "route",
            "mode",
            &[("illustrate", "illustrate"), ("summarize", "summarize")],
        )
        .edge("illustrate", END)
        .edge("summarize", END)
        .build()
}
