//! Composition run records and the in-memory metrics sink
//!
//! Every composition run produces exactly one [`RunRecord`] describing what
//! was applied, what failed, and how the document's size changed. Records
//! are append-only: once created they are never mutated, and they stay in
//! the sink until explicitly cleared. The sink is cheap to clone (shared
//! interior) and safe for concurrent appends from parallel composition
//! calls.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::error::{Error, Result};

/// Outcome of one overlay attempt within a composition run.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateOutcome {
    /// Requested overlay name.
    pub name: String,
    /// Whether the overlay was applied (load succeeded and at least one
    /// section, or an empty template, applied).
    pub success: bool,
    /// Warnings recorded for this overlay: load errors or skipped sections.
    pub warnings: Vec<String>,
    /// Serialized size change the overlay produced, in bytes. Zero for
    /// failed overlays.
    pub size_delta_bytes: i64,
}

/// Audit record of one composition run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    /// Wall-clock start, milliseconds since the Unix epoch.
    pub started_at_ms: u64,
    /// End-to-end duration of the run in milliseconds.
    pub duration_ms: u64,
    /// Serialized byte length of the base document.
    pub base_size: usize,
    /// Serialized byte length of the final document.
    pub final_size: usize,
    /// `final_size / base_size`; 1.0 means overlays had no net size effect.
    /// Observability only, never a control input.
    pub enhancement_ratio: f64,
    /// Names of overlays that applied successfully, in application order.
    /// Failed overlays appear in `per_template` but never here.
    pub applied_template_names: Vec<String>,
    /// One entry per requested overlay, in request order.
    pub per_template: Vec<TemplateOutcome>,
}

/// Append-only, thread-safe log of composition runs.
#[derive(Debug, Clone, Default)]
pub struct MetricsSink {
    records: Arc<Mutex<Vec<RunRecord>>>,
}

impl MetricsSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Each composition run contributes exactly one.
    pub fn append(&self, record: RunRecord) -> Result<()> {
        self.lock_records()?.push(record);
        Ok(())
    }

    /// Snapshot of all recorded runs, oldest first.
    pub fn records(&self) -> Result<Vec<RunRecord>> {
        Ok(self.lock_records()?.clone())
    }

    /// Number of recorded runs.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock_records()?.len())
    }

    /// Whether no runs have been recorded.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock_records()?.is_empty())
    }

    /// Drop all recorded runs.
    pub fn clear(&self) -> Result<()> {
        self.lock_records()?.clear();
        Ok(())
    }

    /// Mean run duration in milliseconds, 0.0 when nothing is recorded.
    pub fn average_duration_ms(&self) -> Result<f64> {
        let records = self.lock_records()?;
        if records.is_empty() {
            return Ok(0.0);
        }
        let total: u64 = records.iter().map(|r| r.duration_ms).sum();
        Ok(total as f64 / records.len() as f64)
    }

    fn lock_records(&self) -> Result<std::sync::MutexGuard<'_, Vec<RunRecord>>> {
        self.records.lock().map_err(|_| Error::LockPoisoned {
            context: "metrics sink".to_string(),
        })
    }
}
