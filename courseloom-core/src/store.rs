//! Storage collaborator interface.
//!
//! Pipelines that read or write durable artifacts (prior weakness summaries,
//! generated media) do so through the [`Store`] trait. The engine treats the
//! store purely as an injected dependency; nothing in the core depends on the
//! backing implementation (relational store, vector index, or file system).

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Error during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No value stored under the key.
    #[error("key not found: {0}")]
    NotFound(String),

    /// Backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    /// Create a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Whether this error means the key simply does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for durable key/value collaborators.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> StoreResult<Value>;

    /// Store `value` under `key`, returning the stored identifier.
    async fn put(&self, key: &str, value: Value) -> StoreResult<String>;
}

/// Shared store handle.
pub type SharedStore = Arc<dyn Store>;

/// In-memory store, for tests and single-process deployments.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with entries.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries.into_iter().collect())),
        }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Value> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn put(&self, key: &str, value: Value) -> StoreResult<String> {
        self.entries.write().insert(key.to_string(), value);
        Ok(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryStore::new();
        let id = store.put("user:1:weaknesses", json!(["pointers"])).await.unwrap();
        assert_eq!(id, "user:1:weaknesses");

        let value = store.get("user:1:weaknesses").await.unwrap();
        assert_eq!(value, json!(["pointers"]));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryStore::new();
        let err = store.get("nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_with_entries() {
        let store = InMemoryStore::with_entries([("a".to_string(), json!(1))]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").await.unwrap(), json!(1));
    }

    #[test]
    fn test_backend_error() {
        let err = StoreError::backend("connection reset");
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("connection reset"));
    }
}
