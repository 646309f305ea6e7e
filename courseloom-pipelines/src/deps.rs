//! Shared pipeline dependencies.
//!
//! Every pipeline receives its collaborators explicitly: the providers it
//! generates with, the store it reads and writes durable artifacts through,
//! and the base generation settings individual steps tighten as needed. No
//! globals; tests inject mocks through the same constructor.

use courseloom_core::{GenerationSettings, SharedStore};
use courseloom_providers::SharedProvider;

/// Injected collaborators for a pipeline.
#[derive(Clone)]
pub struct PipelineDeps {
    /// Primary text provider.
    pub primary: SharedProvider,
    /// Secondary provider for fallback ladders, when configured.
    pub secondary: Option<SharedProvider>,
    /// Durable artifact store.
    pub store: SharedStore,
    /// Base generation settings; steps merge their own overrides on top.
    pub settings: GenerationSettings,
}

impl PipelineDeps {
    /// Create dependencies with a primary provider and store.
    pub fn new(primary: SharedProvider, store: SharedStore) -> Self {
        Self {
            primary,
            secondary: None,
            store,
            settings: GenerationSettings::default(),
        }
    }

    /// Configure a secondary provider for fallback ladders.
    #[must_use]
    pub fn with_secondary(mut self, provider: SharedProvider) -> Self {
        self.secondary = Some(provider);
        self
    }

    /// Set the base generation settings.
    #[must_use]
    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Effective settings for a step: base merged with the step override.
    #[must_use]
    pub fn step_settings(&self, overrides: &GenerationSettings) -> GenerationSettings {
        self.settings.merge(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseloom_core::InMemoryStore;
    use courseloom_providers::MockProvider;
    use std::sync::Arc;

    #[test]
    fn test_step_settings_merge() {
        let deps = PipelineDeps::new(
            Arc::new(MockProvider::new("m")),
            Arc::new(InMemoryStore::new()),
        )
        .with_settings(GenerationSettings::new().temperature(0.7).max_tokens(1024));

        let effective = deps.step_settings(&GenerationSettings::new().temperature(0.2));
        assert_eq!(effective.temperature, Some(0.2));
        assert_eq!(effective.max_tokens, Some(1024));
    }
}
