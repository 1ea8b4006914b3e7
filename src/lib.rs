//! # Prompt Overlay Library
//!
//! This library composes a large generated document (an agent "instruction
//! document") from a base set of structured sections plus an ordered list of
//! named *overlays* that patch, extend, or replace parts of the base. At its
//! center is a deterministic deep-merge engine: given a base document and N
//! overlays applied in order, the final document is fully determined, every
//! run is auditable (which overlay changed what, by how much), and malformed
//! overlays degrade the result instead of breaking it.
//!
//! ## Quick Example
//!
//! ```
//! use prompt_overlay::composer::Composer;
//! use prompt_overlay::source::MemorySource;
//! use prompt_overlay::template::TemplateStore;
//! use serde_json::json;
//!
//! let source = MemorySource::new().with_template(
//!     "tone",
//!     r#"{
//!         "metadata": { "name": "tone", "version": "1.0.0" },
//!         "sections": { "style": { "formal": false } }
//!     }"#,
//! );
//! let composer = Composer::new(TemplateStore::new(source));
//!
//! let base = json!({ "style": { "language": "en" } });
//! let composition = composer.compose(&base, &["tone"]).unwrap();
//!
//! assert_eq!(
//!     composition.document,
//!     json!({ "style": { "language": "en", "formal": false } })
//! );
//! assert_eq!(composition.record.applied_template_names, vec!["tone"]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Deep Merge Primitive (`merge`)**: a pure function reconciling two
//!   JSON values under a merge policy, with optional per-field merge-key
//!   functions giving array elements an identity for upsert semantics.
//! - **Template Store (`template`, `source`)**: loads, validates, and caches
//!   named templates from a pluggable content source.
//! - **Overlay Engine (`overlay`)**: applies one template to an in-progress
//!   document, isolating per-section failures.
//! - **Composer (`composer`)**: orchestrates the ordered overlay run,
//!   accumulates metrics, and provides the known-good-baseline fallback for
//!   fatal failures.
//! - **Metrics Sink (`metrics`)**: append-only, inspectable log of
//!   composition run records.
//!
//! ## Execution Flow
//!
//! One `compose` call runs these steps:
//!
//! 1. Verify the base document is a JSON object (anything else is fatal).
//! 2. For each overlay name, in order: load the template through the store's
//!    write-once cache, apply it section by section through the merge
//!    primitive, and either adopt the merged document or record the failure
//!    and continue.
//! 3. Measure sizes and timing, append one run record to the sink, and
//!    return the final document together with the record.
//!
//! Consumers serialize the resulting document to their transport or display
//! format themselves; this crate owns no I/O beyond the template source.

pub mod composer;
pub mod error;
pub mod merge;
pub mod metrics;
pub mod overlay;
pub mod source;
pub mod template;
pub mod value;

#[cfg(test)]
mod merge_proptest;
