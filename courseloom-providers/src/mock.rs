//! Mock provider for testing.
//!
//! [`MockProvider`] queues scripted outcomes (texts or errors) and records
//! every prompt it receives, so tests can both drive a pipeline and assert on
//! what was asked of the model.
//!
//! # Example
//!
//! ```rust
//! use courseloom_providers::MockProvider;
//!
//! let provider = MockProvider::new("test")
//!     .with_text("first reply")
//!     .with_text("second reply");
//! ```

use crate::error::ProviderError;
use crate::provider::TextProvider;
use async_trait::async_trait;
use courseloom_core::GenerationSettings;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Scripted outcome for a single invocation.
enum Scripted {
    Text(String),
    Error(ProviderError),
}

/// A mock provider with pre-configured responses.
///
/// Outcomes are returned in order; once the script is exhausted, every further
/// call returns a fixed fallthrough text (or a scripted failure for providers
/// built with [`MockProvider::always_failing`]). Clones share the same script
/// and prompt log.
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    script: Arc<Mutex<Vec<Scripted>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    fail_on_exhaustion: Arc<AtomicBool>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("name", &self.name)
            .field("queued", &self.script.lock().len())
            .finish()
    }
}

impl MockProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            fail_on_exhaustion: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a provider that always fails with a connection error.
    #[must_use]
    pub fn always_failing(name: impl Into<String>) -> Self {
        let mock = Self::new(name);
        mock.fail_on_exhaustion.store(true, Ordering::SeqCst);
        mock
    }

    /// Queue a text response.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.script.lock().push(Scripted::Text(text.into()));
        self
    }

    /// Queue an error outcome.
    #[must_use]
    pub fn with_error(self, error: ProviderError) -> Self {
        self.script.lock().push(Scripted::Error(error));
        self
    }

    /// Get every prompt received so far.
    #[must_use]
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Number of invocations so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn invoke(
        &self,
        prompt: &str,
        _settings: &GenerationSettings,
    ) -> Result<String, ProviderError> {
        self.prompts.lock().push(prompt.to_string());

        let mut script = self.script.lock();
        if script.is_empty() {
            if self.fail_on_exhaustion.load(Ordering::SeqCst) {
                return Err(ProviderError::connection("scripted failure"));
            }
            return Ok("mock response".to_string());
        }
        match script.remove(0) {
            Scripted::Text(text) => Ok(text),
            Scripted::Error(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_order() {
        let provider = MockProvider::new("test")
            .with_text("one")
            .with_error(ProviderError::rate_limited(None))
            .with_text("two");

        let settings = GenerationSettings::new();
        assert_eq!(provider.invoke("a", &settings).await.unwrap(), "one");
        assert!(provider.invoke("b", &settings).await.is_err());
        assert_eq!(provider.invoke("c", &settings).await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_records_prompts() {
        let provider = MockProvider::new("test");
        let settings = GenerationSettings::new();
        provider.invoke("first prompt", &settings).await.unwrap();
        provider.invoke("second prompt", &settings).await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(
            provider.recorded_prompts(),
            vec!["first prompt".to_string(), "second prompt".to_string()]
        );
    }

    #[tokio::test]
    async fn test_exhausted_script_falls_through() {
        let provider = MockProvider::new("test").with_text("only");
        let settings = GenerationSettings::new();
        provider.invoke("a", &settings).await.unwrap();
        assert_eq!(provider.invoke("b", &settings).await.unwrap(), "mock response");
    }

    #[tokio::test]
    async fn test_always_failing() {
        let provider = MockProvider::always_failing("down");
        let settings = GenerationSettings::new();
        assert!(provider.invoke("a", &settings).await.is_err());
        assert!(provider.invoke("b", &settings).await.is_err());
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let provider = MockProvider::new("shared").with_text("one");
        let clone = provider.clone();
        let settings = GenerationSettings::new();

        clone.invoke("from clone", &settings).await.unwrap();
        assert_eq!(provider.call_count(), 1);
    }
}
