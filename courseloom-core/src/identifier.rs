//! ID generation utilities.

use uuid::Uuid;

/// Generate a unique run ID.
///
/// Returns a UUID v4 string prefixed with "run_".
///
/// # Example
///
/// ```rust
/// use courseloom_core::identifier::generate_run_id;
///
/// let id = generate_run_id();
/// assert!(id.starts_with("run_"));
/// ```
#[must_use]
pub fn generate_run_id() -> String {
    format!("run_{}", Uuid::new_v4().simple())
}

/// Generate a unique artifact ID.
///
/// Returns a UUID v4 string prefixed with "art_".
#[must_use]
pub fn generate_artifact_id() -> String {
    format!("art_{}", Uuid::new_v4().simple())
}
