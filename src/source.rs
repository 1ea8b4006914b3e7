//! Backing content sources for the template store
//!
//! Templates are stored outside the engine; the store only needs a way to
//! fetch the raw JSON text for a name. [`ContentSource`] is that seam, with
//! two implementations: an in-memory map used by tests and embedders that
//! carry their templates in code, and a directory source that reads
//! `<dir>/<name>.json` from disk.
//!
//! Sources perform exactly one read per request and never retry; retry and
//! timeout policy belongs to the caller (or to a wrapping source).

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::Result;

/// A backing store of raw template content, addressed by template name.
pub trait ContentSource: Send + Sync {
    /// Fetch the raw content for a template name. `Ok(None)` means no
    /// backing content exists for the name; `Err` means the read itself
    /// failed.
    fn read(&self, name: &str) -> Result<Option<String>>;

    /// Human-readable description of the source, used in log lines.
    fn describe(&self) -> String;
}

/// In-memory content source backed by a name -> content map.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    templates: HashMap<String, String>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, builder style.
    pub fn with_template(mut self, name: &str, content: &str) -> Self {
        self.add_template(name, content);
        self
    }

    /// Add or replace a template.
    pub fn add_template(&mut self, name: &str, content: &str) {
        self.templates.insert(name.to_string(), content.to_string());
    }

    /// Number of templates held.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the source holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl ContentSource for MemorySource {
    fn read(&self, name: &str) -> Result<Option<String>> {
        Ok(self.templates.get(name).cloned())
    }

    fn describe(&self) -> String {
        format!("memory source ({} templates)", self.templates.len())
    }
}

/// Directory-backed content source reading `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    /// Create a source rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory this source reads from.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl ContentSource for DirSource {
    fn read(&self, name: &str) -> Result<Option<String>> {
        let path = self.dir.join(format!("{}.json", name));
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn describe(&self) -> String {
        format!("directory source ({})", self.dir.display())
    }
}
