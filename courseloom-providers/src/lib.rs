//! # courseloom-providers
//!
//! Capability providers and fallback chains for courseloom.
//!
//! A capability provider turns a prompt into generated text; a fallback chain
//! wraps one logical step with an ordered list of alternative providers (or
//! provider + post-processing pairs) and returns the first usable result.
//!
//! ## Backends
//!
//! - **[`GatewayProvider`]**: the hosted model gateway (HTTP)
//! - **[`TemplateProvider`]**: deterministic template expansion, the terminal
//!   fallback tier
//! - **[`MockProvider`]**: scripted outcomes for tests
//!
//! ## Example
//!
//! ```rust
//! use courseloom_providers::{FallbackChain, MockProvider, Tier};
//! use courseloom_core::GenerationSettings;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let chain = FallbackChain::new()
//!     .tier(Tier::text("primary", Arc::new(MockProvider::new("m").with_text("ok"))));
//!
//! let resolved = chain.resolve("prompt", &GenerationSettings::new()).await.unwrap();
//! assert_eq!(resolved.artifact, "ok");
//! # });
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod fallback;
pub mod gateway;
pub mod mock;
pub mod provider;
pub mod template;

// Re-exports
pub use error::{ProviderError, ProviderResult};
pub use fallback::{AllFailed, Attempt, FallbackChain, Resolved, Tier};
pub use gateway::{GatewayConfig, GatewayProvider};
pub use mock::MockProvider;
pub use provider::{SharedProvider, TextProvider};
pub use template::{TemplateProvider, PROMPT_SLOT};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        AllFailed, FallbackChain, GatewayConfig, GatewayProvider, MockProvider, ProviderError,
        SharedProvider, TemplateProvider, TextProvider, Tier,
    };
}
