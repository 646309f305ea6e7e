//! Core provider trait.
//!
//! A capability provider turns a prompt into generated text. The engine is
//! agnostic to how: hosted model API behind a gateway, a local heuristic, or a
//! static template. Every backend implements [`TextProvider`].

use crate::error::ProviderError;
use async_trait::async_trait;
use courseloom_core::GenerationSettings;
use std::sync::Arc;

/// Core capability-provider trait.
///
/// Implementations must be safe to share across concurrent pipeline runs;
/// they hold no per-run state.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Get the provider name (e.g. "gateway", "template").
    fn name(&self) -> &str;

    /// Get the model selector this provider targets by default.
    fn model(&self) -> &str {
        "default"
    }

    /// Get the full provider identifier.
    fn identifier(&self) -> String {
        format!("{}:{}", self.name(), self.model())
    }

    /// Generate text from a prompt.
    async fn invoke(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, ProviderError>;
}

/// Shared provider handle for dynamic dispatch.
pub type SharedProvider = Arc<dyn TextProvider>;
