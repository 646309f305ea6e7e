//! Static template provider.
//!
//! The last rung of most fallback ladders: no network, no model, just a fixed
//! template with the prompt substituted in. It cannot fail, which is exactly
//! what a terminal fallback tier needs to guarantee.

use crate::error::ProviderError;
use crate::provider::TextProvider;
use async_trait::async_trait;
use courseloom_core::GenerationSettings;

/// Placeholder used for prompt substitution in templates.
pub const PROMPT_SLOT: &str = "{prompt}";

/// A provider that expands a fixed template.
#[derive(Debug, Clone)]
pub struct TemplateProvider {
    name: String,
    template: String,
}

impl TemplateProvider {
    /// Create a provider that fills `template`, replacing [`PROMPT_SLOT`]
    /// with the invocation prompt.
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    /// Create a provider that echoes the prompt unchanged.
    #[must_use]
    pub fn echo(name: impl Into<String>) -> Self {
        Self::new(name, PROMPT_SLOT)
    }
}

#[async_trait]
impl TextProvider for TemplateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "template"
    }

    async fn invoke(
        &self,
        prompt: &str,
        _settings: &GenerationSettings,
    ) -> Result<String, ProviderError> {
        Ok(self.template.replace(PROMPT_SLOT, prompt))
    }
}
