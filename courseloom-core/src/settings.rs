//! Generation settings for provider calls.
//!
//! This module provides the `GenerationSettings` type used to configure a
//! single capability-provider invocation: sampling temperature, output length,
//! model selection, and request timeout.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for a single text-generation call.
///
/// All fields are optional; a provider applies its own defaults for anything
/// left unset. Settings compose with [`GenerationSettings::merge`], which
/// prefers the override side, so a pipeline can carry base settings and
/// individual steps can tighten them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Sampling temperature (0.0 to 1.0 typically).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,

    /// Model selector understood by the provider (e.g. a gateway model id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Request timeout.
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "option_duration_serde"
    )]
    pub timeout: Option<Duration>,
}

impl GenerationSettings {
    /// Create new empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature.
    #[must_use]
    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set max tokens.
    #[must_use]
    pub fn max_tokens(mut self, tokens: u64) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Set the model selector.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set timeout in seconds.
    #[must_use]
    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    /// Merge with another settings, preferring values from `other`.
    ///
    /// Values in `other` override values in `self` when both are present.
    #[must_use]
    pub fn merge(&self, other: &GenerationSettings) -> GenerationSettings {
        GenerationSettings {
            temperature: other.temperature.or(self.temperature),
            max_tokens: other.max_tokens.or(self.max_tokens),
            model: other.model.clone().or_else(|| self.model.clone()),
            timeout: other.timeout.or(self.timeout),
        }
    }

    /// Check if all settings are None.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.max_tokens.is_none()
            && self.model.is_none()
            && self.timeout.is_none()
    }
}

/// Serde helper for optional Duration.
mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs_f64().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<f64> = Option::deserialize(deserializer)?;
        Ok(opt.map(Duration::from_secs_f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_new() {
        let settings = GenerationSettings::new();
        assert!(settings.is_empty());
    }

    #[test]
    fn test_settings_builder() {
        let settings = GenerationSettings::new()
            .temperature(0.6)
            .max_tokens(2048)
            .model("loom-text-large");

        assert_eq!(settings.temperature, Some(0.6));
        assert_eq!(settings.max_tokens, Some(2048));
        assert_eq!(settings.model.as_deref(), Some("loom-text-large"));
    }

    #[test]
    fn test_settings_merge() {
        let base = GenerationSettings::new().temperature(0.5).max_tokens(1024);
        let step = GenerationSettings::new().temperature(0.2).model("loom-text-small");

        let merged = base.merge(&step);

        assert_eq!(merged.temperature, Some(0.2)); // overridden
        assert_eq!(merged.max_tokens, Some(1024)); // from base
        assert_eq!(merged.model.as_deref(), Some("loom-text-small")); // from override
    }

    #[test]
    fn test_settings_timeout() {
        let settings = GenerationSettings::new().timeout_secs(30);
        assert_eq!(settings.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_serde_roundtrip() {
        let settings = GenerationSettings::new()
            .temperature(0.3)
            .max_tokens(800)
            .timeout_secs(15);

        let json = serde_json::to_string(&settings).unwrap();
        let parsed: GenerationSettings = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.temperature, settings.temperature);
        assert_eq!(parsed.max_tokens, settings.max_tokens);
        assert!(parsed.timeout.is_some());
    }
}
