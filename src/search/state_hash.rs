//! Deterministic state hashing
//!
//! Used to check that two searches saw identical positions and that a search
//! left its root untouched.

use crate::search::SearchState;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Fields that do not affect the position being searched
///
/// - time_step: Search setting, overwritten by each engine
/// - last_action: History, never read by generation or evaluation
const EXCLUDED_FIELDS: &[&str] = &["time_step", "last_action"];

/// Compute a deterministic hash of a search state
///
/// The state is serialized to JSON, stripped of excluded fields and hashed
/// in canonical string form. Equal positions hash equally.
pub fn compute_state_hash(state: &SearchState) -> u64 {
    let json_value = match serde_json::to_value(state) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Warning: Failed to serialize search state for hashing: {}", e);
            return 0;
        }
    };

    let canonical = match serde_json::to_string(&strip_metadata(json_value)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Warning: Failed to canonicalize cleaned state: {}", e);
            return 0;
        }
    };

    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    hasher.finish()
}

fn strip_metadata(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .filter(|(k, _)| !EXCLUDED_FIELDS.contains(&k.as_str()))
                .map(|(k, v)| (k, strip_metadata(v)))
                .collect(),
        ),
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(strip_metadata).collect())
        }
        other => other,
    }
}

/// Format a hash for display (shows first 8 hex digits)
pub fn format_hash(hash: u64) -> String {
    format!("{:08x}", (hash >> 32) as u32)
}
