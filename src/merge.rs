//! Deep merge primitive for JSON documents
//!
//! This module provides the pure merge function underlying overlay
//! application. It reconciles two JSON values under a [`MergePolicy`] and an
//! optional set of per-field [merge-key functions](MergeKeyFn) that give
//! array elements an identity across the two sides.
//!
//! ## Semantics
//!
//! For each key of the incoming value under [`MergePolicy::Merge`]:
//!
//! - Both sides arrays with a merge-key registered for the field: elements
//!   of the existing array that match any incoming element are dropped, and
//!   the incoming array is appended after the surviving originals (upsert
//!   semantics without duplicate keys).
//! - Both sides arrays without a merge-key: straight concatenation.
//!   Duplicates are possible and intentional; this is a positional append,
//!   not a set union.
//! - Both sides objects: recursive descent.
//! - Any other pairing: the incoming value wins outright.
//!
//! [`MergePolicy::Overwrite`] short-circuits all of the above: every shared
//! key takes the incoming value wholesale, with no recursion and no array
//! reconciliation.
//!
//! The function never fails and never mutates its inputs. The existing value
//! is defensively cloned under a recursion budget before any reconciliation;
//! if that clone fails the merge degrades to a shallow one-level union and
//! logs a `warn!` diagnostic so the degraded path stays observable.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::warn;
use serde_json::Value;

use crate::value::{clone_guarded, DEPTH_LIMIT};

/// Policy selecting how shared keys are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Recursive reconciliation: objects descend, arrays concatenate or
    /// upsert, scalars take the incoming value.
    #[default]
    Merge,
    /// Every shared key is replaced wholesale by the incoming value.
    Overwrite,
}

/// Per-field array-element identity predicate.
///
/// Invoked only when both sides of the named field are arrays. Returns true
/// when the two elements represent the same logical entry (e.g. rows whose
/// `id` fields match), in which case the incoming element replaces the
/// existing one.
pub type MergeKeyFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Registry of merge-key functions, keyed by field name.
#[derive(Clone, Default)]
pub struct MergeKeys {
    keys: HashMap<String, MergeKeyFn>,
}

impl MergeKeys {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a merge-key function for a field, builder style.
    pub fn with<F>(mut self, field: &str, key_fn: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.keys.insert(field.to_string(), Arc::new(key_fn));
        self
    }

    /// Register a merge-key that matches elements on a shared object field,
    /// e.g. `by_field("rows", "id")` treats two rows as the same entry when
    /// their `id` values are equal. Elements missing the field never match.
    pub fn by_field(self, field: &str, id_field: &str) -> Self {
        let id_field = id_field.to_string();
        self.with(field, move |a, b| match (a.get(&id_field), b.get(&id_field)) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        })
    }

    /// Look up the merge-key function registered for a field.
    pub fn get(&self, field: &str) -> Option<&MergeKeyFn> {
        self.keys.get(field)
    }

    /// Whether any merge-key is registered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for MergeKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeKeys")
            .field("fields", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Merge `second` into `first`, producing a fresh value.
///
/// Neither input is mutated; the result shares no mutable state with either.
/// See the module documentation for the reconciliation rules.
pub fn merge(first: &Value, second: &Value, policy: MergePolicy, keys: &MergeKeys) -> Value {
    match (first, second) {
        (Value::Object(_), Value::Object(_)) => match clone_guarded(first, DEPTH_LIMIT) {
            Ok(base) => merge_into(base, second, policy, keys),
            Err(err) => {
                warn!(
                    "defensive clone failed before merge ({}); degrading to shallow one-level union",
                    err
                );
                shallow_union(first, second)
            }
        },
        (Value::Array(existing), Value::Array(incoming)) if policy == MergePolicy::Merge => {
            let mut items = existing.clone();
            items.extend(incoming.iter().cloned());
            Value::Array(items)
        }
        // Mixed-type pairs carry no meaningful reconciliation; the incoming
        // value wins. Scalar pairs and Overwrite land here too.
        _ => second.clone(),
    }
}

/// Recursive reconciliation over an owned base value.
fn merge_into(mut base: Value, second: &Value, policy: MergePolicy, keys: &MergeKeys) -> Value {
    // Callers guarantee an object pair; anything else falls back to the
    // mixed-type rule.
    let (Some(base_map), Value::Object(incoming_map)) = (base.as_object_mut(), second) else {
        return second.clone();
    };

    for (key, incoming_value) in incoming_map {
        if let Some(slot) = base_map.get_mut(key) {
            if policy == MergePolicy::Overwrite {
                *slot = incoming_value.clone();
            } else {
                let existing = slot.take();
                *slot = reconcile(existing, incoming_value, key, policy, keys);
            }
            continue;
        }
        base_map.insert(key.clone(), incoming_value.clone());
    }

    base
}

/// Reconcile a single shared key under `MergePolicy::Merge`.
fn reconcile(
    existing: Value,
    incoming: &Value,
    field: &str,
    policy: MergePolicy,
    keys: &MergeKeys,
) -> Value {
    match (existing, incoming) {
        (Value::Array(existing_items), Value::Array(incoming_items)) => {
            if let Some(key_fn) = keys.get(field) {
                upsert(existing_items, incoming_items, key_fn)
            } else {
                let mut items = existing_items;
                items.extend(incoming_items.iter().cloned());
                Value::Array(items)
            }
        }
        (existing @ Value::Object(_), Value::Object(_)) => {
            merge_into(existing, incoming, policy, keys)
        }
        _ => incoming.clone(),
    }
}

/// Upsert reconciliation: surviving unmatched originals first, then every
/// incoming element.
fn upsert(existing: Vec<Value>, incoming: &[Value], key_fn: &MergeKeyFn) -> Value {
    let mut items: Vec<Value> = existing
        .into_iter()
        .filter(|item| !incoming.iter().any(|candidate| key_fn(item, candidate)))
        .collect();
    items.extend(incoming.iter().cloned());
    Value::Array(items)
}

/// Shallow one-level union fallback: `{...first, ...second}` semantics with
/// no recursion. Only reached when the defensive clone fails.
fn shallow_union(first: &Value, second: &Value) -> Value {
    match (first, second) {
        (Value::Object(first_map), Value::Object(second_map)) => {
            let mut union = first_map.clone();
            for (key, value) in second_map {
                union.insert(key.clone(), value.clone());
            }
            Value::Object(union)
        }
        _ => second.clone(),
    }
}
