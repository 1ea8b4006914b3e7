//! JSON value helpers shared by the merge primitive and the composer
//!
//! Documents, templates, and sections are all plain `serde_json::Value`
//! trees, so every merge branch is checked exhaustively against the tagged
//! `Value` enum rather than inspected with runtime duck typing. This module
//! holds the small value-level utilities: a structural deep clone guarded by
//! an explicit recursion budget, a nesting-depth probe, a serialized-size
//! measure, and a human-readable kind name for diagnostics.

use serde_json::Value;

use crate::error::{Error, Result};

/// Recursion budget for guarded clones and section reconciliation.
///
/// Well-formed instruction documents are a handful of levels deep; anything
/// approaching this limit is either pathological input or a bug upstream,
/// and the merge pipeline degrades rather than recursing further.
pub const DEPTH_LIMIT: usize = 128;

/// Structurally deep-clone a JSON value under a recursion budget.
///
/// Every node of the result is freshly allocated, so the clone shares no
/// mutable state with `value`. Values nesting deeper than `budget` container
/// levels fail predictably with [`Error::DepthExceeded`] instead of
/// recursing without bound.
pub fn clone_guarded(value: &Value, budget: usize) -> Result<Value> {
    clone_levels(value, budget, budget)
}

fn clone_levels(value: &Value, remaining: usize, budget: usize) -> Result<Value> {
    match value {
        Value::Array(items) => {
            if remaining == 0 {
                return Err(Error::DepthExceeded { limit: budget });
            }
            let mut cloned = Vec::with_capacity(items.len());
            for item in items {
                cloned.push(clone_levels(item, remaining - 1, budget)?);
            }
            Ok(Value::Array(cloned))
        }
        Value::Object(map) => {
            if remaining == 0 {
                return Err(Error::DepthExceeded { limit: budget });
            }
            let mut cloned = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                cloned.insert(key.clone(), clone_levels(item, remaining - 1, budget)?);
            }
            Ok(Value::Object(cloned))
        }
        scalar => Ok(scalar.clone()),
    }
}

/// Check whether a value nests deeper than `limit` container levels.
///
/// Scalars never exceed any limit; a container encountered with no budget
/// left does. Traversal itself is bounded by `limit`, so probing a
/// pathologically deep value is safe.
pub fn exceeds_depth(value: &Value, limit: usize) -> bool {
    match value {
        Value::Array(items) => limit == 0 || items.iter().any(|v| exceeds_depth(v, limit - 1)),
        Value::Object(map) => limit == 0 || map.values().any(|v| exceeds_depth(v, limit - 1)),
        _ => false,
    }
}

/// Serialized byte length of a value, used for size metrics.
pub fn serialized_size(value: &Value) -> usize {
    serde_json::to_vec(value).map(|bytes| bytes.len()).unwrap_or(0)
}

/// Human-readable kind name for diagnostics and error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
