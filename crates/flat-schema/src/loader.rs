//! Schema description loader

use crate::model::SchemaDescription;
use crate::registry::SchemaCache;
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Loads schema descriptions from JSON or YAML, caching file loads
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    cache: Arc<SchemaCache>,
}

impl SchemaLoader {
    /// Create a new loader with its own cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader sharing an existing cache
    #[must_use]
    pub fn with_cache(cache: Arc<SchemaCache>) -> Self {
        Self { cache }
    }

    /// Load a description from a file, reusing the cached copy if present.
    ///
    /// `.yaml`/`.yml` files are read as YAML, anything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist, [`Error::Io`]
    /// on read failure and [`Error::InvalidFormat`] on parse failure.
    pub fn load_from_file(&self, path: &Path) -> Result<Arc<SchemaDescription>> {
        if !path.is_file() {
            return Err(Error::NotFound(path.display().to_string()));
        }

        let key = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf())
            .display()
            .to_string();

        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit for schema: {}", key);
            return Ok(cached);
        }

        info!("Loading schema from file: {}", key);
        let content = std::fs::read_to_string(path)?;

        let schema = if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            self.load_from_yaml(&content)?
        } else {
            self.load_from_json(&content)?
        };

        Ok(self.cache.register(key, schema))
    }

    /// Load a description from JSON text
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] on parse failure.
    pub fn load_from_json(&self, json: &str) -> Result<SchemaDescription> {
        let schema: SchemaDescription = serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))?;
        trace!(name = %schema.name, segments = schema.segments.len(), "Parsed JSON schema");
        Ok(schema)
    }

    /// Load a description from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] on parse failure.
    pub fn load_from_yaml(&self, yaml: &str) -> Result<SchemaDescription> {
        let schema: SchemaDescription = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))?;
        trace!(name = %schema.name, segments = schema.segments.len(), "Parsed YAML schema");
        Ok(schema)
    }

    /// Load a description from an already parsed JSON value
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] if the value does not match the model.
    pub fn load_from_value(&self, value: serde_json::Value) -> Result<SchemaDescription> {
        serde_json::from_value(value)
            .map_err(|e| Error::InvalidFormat(format!("JSON value error: {e}")))
    }

    /// Get the cache (for testing/debugging)
    #[must_use]
    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }
}
