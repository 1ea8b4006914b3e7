//! Overlay application onto a composed document
//!
//! The overlay engine applies one loaded template to an in-progress
//! document: sections absent from the document are inserted verbatim,
//! sections already present are reconciled through the deep merge primitive
//! under the fixed `Merge` policy. A failure in one section never aborts the
//! whole template; the section's prior value is kept, a warning naming the
//! section is recorded, and the remaining sections proceed. The outcome is
//! marked unsuccessful only when every section failed.

use log::{debug, info, warn};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::merge::{merge, MergeKeys, MergePolicy};
use crate::template::Template;
use crate::value::{exceeds_depth, kind_name, DEPTH_LIMIT};

/// Result of applying one template to a document.
#[derive(Debug, Clone)]
pub struct OverlayOutcome {
    /// False only when every section of the template failed to apply.
    pub success: bool,
    /// The document after application. On failure this is an unmodified
    /// copy of the input document.
    pub document: Value,
    /// One warning per skipped section, naming the section and the cause.
    pub warnings: Vec<String>,
    /// Names of sections that were inserted or merged, in template order.
    pub applied_sections: Vec<String>,
}

/// Applies templates as overlays, one at a time.
#[derive(Debug, Clone, Default)]
pub struct OverlayEngine {
    merge_keys: MergeKeys,
}

impl OverlayEngine {
    /// Create an engine with no merge-key functions registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a merge-key registry for array upserts.
    pub fn with_merge_keys(merge_keys: MergeKeys) -> Self {
        Self { merge_keys }
    }

    /// Apply a template to a document, producing a fresh document.
    ///
    /// The input document is never mutated. Sections merge under
    /// `MergePolicy::Merge`; per-section policy selection is deliberately
    /// not exposed here.
    pub fn apply(&self, document: &Value, template: &Template) -> OverlayOutcome {
        let name = &template.metadata.name;
        debug!("applying template: {}", name);

        let mut result = document.clone();
        let Some(target) = result.as_object_mut() else {
            warn!(
                "template {} not applied: document is {}, not an object",
                name,
                kind_name(document)
            );
            return OverlayOutcome {
                success: false,
                document: document.clone(),
                warnings: vec![format!(
                    "document is {}, not an object; overlay skipped",
                    kind_name(document)
                )],
                applied_sections: Vec::new(),
            };
        };

        let mut warnings = Vec::new();
        let mut applied_sections = Vec::new();

        for (section_name, incoming) in &template.sections {
            let staged = match target.get(section_name.as_str()) {
                None => Ok(incoming.clone()),
                Some(existing) => merge_section(existing, incoming, section_name, &self.merge_keys),
            };
            match staged {
                Ok(merged) => {
                    target.insert(section_name.clone(), merged);
                    debug!("applied section: {}", section_name);
                    applied_sections.push(section_name.clone());
                }
                Err(err) => {
                    // Prior value stays in place; remaining sections still
                    // get their chance.
                    warn!("section skipped in template {}: {}", name, err);
                    warnings.push(format!("section '{}' left unmerged: {}", section_name, err));
                }
            }
        }

        let success = template.sections.is_empty() || !applied_sections.is_empty();
        info!(
            "template {} applied: {} sections merged, {} skipped",
            name,
            applied_sections.len(),
            warnings.len()
        );

        OverlayOutcome {
            success,
            document: result,
            warnings,
            applied_sections,
        }
    }
}

/// Reconcile one section, refusing inputs that nest beyond the recursion
/// budget so the merge below never trips its degraded shallow path.
fn merge_section(
    existing: &Value,
    incoming: &Value,
    section: &str,
    keys: &MergeKeys,
) -> Result<Value> {
    for (side, value) in [("existing", existing), ("incoming", incoming)] {
        if exceeds_depth(value, DEPTH_LIMIT) {
            return Err(Error::MergeSection {
                section: section.to_string(),
                message: format!(
                    "{} value nests deeper than {} levels",
                    side, DEPTH_LIMIT
                ),
            });
        }
    }
    Ok(merge(existing, incoming, MergePolicy::Merge, keys))
}
