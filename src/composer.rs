//! Composition orchestration
//!
//! The composer owns the end-to-end run: it takes a base document and an
//! ordered list of overlay names, loads each template through the store,
//! applies it through the overlay engine, and accumulates one [`RunRecord`]
//! per run in the metrics sink. Overlay order is semantically significant
//! (later overlays observe and can override the fully merged output of
//! earlier ones), so templates are loaded and applied strictly sequentially.
//!
//! Failure handling is layered. A missing or malformed template, or an
//! overlay whose sections all fail, is recorded and skipped; composition
//! continues with the remaining names. Only conditions outside that
//! per-overlay recovery, such as a base document that is not a JSON object,
//! abort the run with [`Error::CompositionFatal`] so the caller can serve an
//! independently produced baseline instead of a partially built document.
//! [`Composer::compose_with_baseline`] packages that substitution, logging
//! the fatal path distinctly from per-overlay warnings.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use log::{debug, error, info};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::merge::MergeKeys;
use crate::metrics::{MetricsSink, RunRecord, TemplateOutcome};
use crate::overlay::OverlayEngine;
use crate::template::TemplateStore;
use crate::value::{kind_name, serialized_size};

/// Result of one composition run: the final document plus its audit record.
#[derive(Debug, Clone)]
pub struct Composition {
    pub document: Value,
    pub record: RunRecord,
}

/// Orchestrates base-document composition across ordered overlays.
///
/// A composer is an explicit, constructible instance: build one, share it by
/// reference across as many `compose` calls as needed, drop it when done.
/// There is no process-wide state, so tests can construct isolated instances
/// freely.
#[derive(Debug)]
pub struct Composer {
    store: TemplateStore,
    engine: OverlayEngine,
    sink: MetricsSink,
}

impl Composer {
    /// Create a composer over a template store, with no merge keys and a
    /// fresh metrics sink.
    pub fn new(store: TemplateStore) -> Self {
        Self {
            store,
            engine: OverlayEngine::new(),
            sink: MetricsSink::new(),
        }
    }

    /// Register merge-key functions for array upserts, builder style.
    pub fn with_merge_keys(mut self, merge_keys: MergeKeys) -> Self {
        self.engine = OverlayEngine::with_merge_keys(merge_keys);
        self
    }

    /// Use an existing sink, e.g. one shared with other composers.
    pub fn with_sink(mut self, sink: MetricsSink) -> Self {
        self.sink = sink;
        self
    }

    /// The metrics sink accumulating this composer's run records.
    pub fn sink(&self) -> &MetricsSink {
        &self.sink
    }

    /// The template store backing this composer.
    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Compose the base document with the named overlays, in order.
    ///
    /// A load or application failure for one overlay records a failed
    /// [`TemplateOutcome`] and moves on; the run never aborts because one
    /// named overlay is missing. Fatal conditions (non-object base, poisoned
    /// locks) surface as errors and leave no record behind.
    pub fn compose<S: AsRef<str>>(&self, base: &Value, overlay_names: &[S]) -> Result<Composition> {
        let started = Instant::now();
        let started_at_ms = epoch_ms();

        if !base.is_object() {
            return Err(Error::CompositionFatal {
                message: format!(
                    "base document must be a JSON object, got {}",
                    kind_name(base)
                ),
            });
        }

        let base_size = serialized_size(base);
        // Working copy; the caller's base is never aliased or mutated.
        let mut current = base.clone();
        let mut current_size = base_size;
        let mut applied_template_names = Vec::new();
        let mut per_template = Vec::new();

        for name in overlay_names {
            let name = name.as_ref();
            let template = match self.store.load(name) {
                Ok(template) => template,
                Err(err) => {
                    debug!("overlay {} skipped: {}", name, err);
                    per_template.push(TemplateOutcome {
                        name: name.to_string(),
                        success: false,
                        warnings: vec![err.to_string()],
                        size_delta_bytes: 0,
                    });
                    continue;
                }
            };

            let outcome = self.engine.apply(&current, &template);
            if outcome.success {
                let new_size = serialized_size(&outcome.document);
                per_template.push(TemplateOutcome {
                    name: name.to_string(),
                    success: true,
                    warnings: outcome.warnings,
                    size_delta_bytes: new_size as i64 - current_size as i64,
                });
                current = outcome.document;
                current_size = new_size;
                applied_template_names.push(name.to_string());
            } else {
                per_template.push(TemplateOutcome {
                    name: name.to_string(),
                    success: false,
                    warnings: outcome.warnings,
                    size_delta_bytes: 0,
                });
            }
        }

        let final_size = current_size;
        let record = RunRecord {
            started_at_ms,
            duration_ms: started.elapsed().as_millis() as u64,
            base_size,
            final_size,
            enhancement_ratio: if base_size == 0 {
                1.0
            } else {
                final_size as f64 / base_size as f64
            },
            applied_template_names,
            per_template,
        };

        info!(
            "composition finished: {}/{} overlays applied, {} -> {} bytes ({}ms)",
            record.applied_template_names.len(),
            overlay_names.len(),
            record.base_size,
            record.final_size,
            record.duration_ms
        );
        self.sink.append(record.clone())?;

        Ok(Composition {
            document: current,
            record,
        })
    }

    /// Compose, substituting an independently produced baseline on fatal
    /// failure.
    ///
    /// The pipeline-level safety net: per-overlay failures are already
    /// absorbed inside `compose`, so reaching the baseline here means the
    /// whole enhancement layer failed, and the distinct `error!` log keeps
    /// the two situations distinguishable for operators. The baseline is
    /// returned verbatim with no run record.
    pub fn compose_with_baseline<S, F>(
        &self,
        base: &Value,
        overlay_names: &[S],
        baseline: F,
    ) -> (Value, Option<RunRecord>)
    where
        S: AsRef<str>,
        F: FnOnce() -> Value,
    {
        match self.compose(base, overlay_names) {
            Ok(composition) => (composition.document, Some(composition.record)),
            Err(err) => {
                error!("composition failed, serving known-good baseline: {}", err);
                (baseline(), None)
            }
        }
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
