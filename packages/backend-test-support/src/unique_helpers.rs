//! Test helpers for generating unique test data
//!
//! Unique identifiers keep tests isolated from each other when they share
//! in-process registries.

use uuid::Uuid;

/// Generate a unique string with the given prefix, e.g. `coach-<uuid>`.
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}
