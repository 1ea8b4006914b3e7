//! Template shapes and the caching template store
//!
//! A template is a JSON document of shape
//! `{ "metadata": { "name", "version", ... }, "sections": { ... } }`.
//! Unknown top-level keys are ignored, not rejected. Templates are immutable
//! once loaded; identity is the name they were requested under.
//!
//! [`TemplateStore`] loads templates from a [`ContentSource`], validates the
//! minimal shape, and caches successful loads for the life of the store.
//! The cache is write-once per name: repeated loads return the same
//! `Arc<Template>` without re-reading the backing content, and the cache
//! lock is held across the backing read so a first-load race for the same
//! uncached name is serialized instead of reading the source twice.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::source::ContentSource;

/// Descriptive metadata carried by every template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMetadata {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// A named overlay template: metadata plus a map of section name to section
/// content. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub metadata: TemplateMetadata,
    pub sections: serde_json::Map<String, Value>,
}

impl Template {
    /// Parse and validate template content.
    ///
    /// Deserialization enforces the minimal shape (present `metadata.name`
    /// and `metadata.version`, map-typed `sections`); anything that fails it
    /// surfaces as [`Error::TemplateMalformed`] naming the requested
    /// template.
    pub fn parse(name: &str, content: &str) -> Result<Self> {
        let template: Template =
            serde_json::from_str(content).map_err(|err| Error::TemplateMalformed {
                name: name.to_string(),
                message: err.to_string(),
            })?;

        if template.metadata.name.is_empty() {
            return Err(Error::TemplateMalformed {
                name: name.to_string(),
                message: "metadata.name must not be empty".to_string(),
            });
        }
        if template.metadata.version.is_empty() {
            return Err(Error::TemplateMalformed {
                name: name.to_string(),
                message: "metadata.version must not be empty".to_string(),
            });
        }

        Ok(template)
    }
}

/// Caching loader of named templates.
pub struct TemplateStore {
    source: Box<dyn ContentSource>,
    cache: Mutex<HashMap<String, Arc<Template>>>,
}

impl TemplateStore {
    /// Create a store over a content source.
    pub fn new<S: ContentSource + 'static>(source: S) -> Self {
        debug!("template store initialized over {}", source.describe());
        Self {
            source: Box::new(source),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load a template by name, consulting the cache first.
    ///
    /// Fails with [`Error::TemplateNotFound`] when the source has no content
    /// for the name and [`Error::TemplateMalformed`] when the content fails
    /// shape validation. The store never retries the backing read.
    pub fn load(&self, name: &str) -> Result<Arc<Template>> {
        let mut cache = self.lock_cache()?;
        if let Some(template) = cache.get(name) {
            debug!("using cached template: {}", name);
            return Ok(Arc::clone(template));
        }

        let content = self
            .source
            .read(name)?
            .ok_or_else(|| Error::TemplateNotFound {
                name: name.to_string(),
            })?;
        let template = Arc::new(Template::parse(name, &content)?);
        cache.insert(name.to_string(), Arc::clone(&template));

        info!(
            "template loaded: {} v{} ({} sections)",
            name,
            template.metadata.version,
            template.sections.len()
        );
        Ok(template)
    }

    /// Best-effort bulk load. Failures are logged and skipped; the returned
    /// list contains the names that loaded successfully, in request order.
    pub fn preload<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut loaded = Vec::new();
        for name in names {
            let name = name.as_ref();
            match self.load(name) {
                Ok(_) => loaded.push(name.to_string()),
                Err(err) => warn!("failed to preload template {}: {}", name, err),
            }
        }
        info!("templates preloaded: {}/{} successful", loaded.len(), names.len());
        loaded
    }

    /// Whether a template is already cached.
    pub fn is_cached(&self, name: &str) -> Result<bool> {
        Ok(self.lock_cache()?.contains_key(name))
    }

    /// Names of all cached templates.
    pub fn cached_templates(&self) -> Result<Vec<String>> {
        Ok(self.lock_cache()?.keys().cloned().collect())
    }

    /// Drop all cached templates, returning how many were removed.
    pub fn clear_cache(&self) -> Result<usize> {
        let mut cache = self.lock_cache()?;
        let removed = cache.len();
        cache.clear();
        info!("template cache cleared: {} templates removed", removed);
        Ok(removed)
    }

    /// Description of the backing source, for diagnostics.
    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Arc<Template>>>> {
        self.cache.lock().map_err(|_| Error::LockPoisoned {
            context: "template cache".to_string(),
        })
    }
}

impl std::fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateStore")
            .field("source", &self.source.describe())
            .finish()
    }
}
