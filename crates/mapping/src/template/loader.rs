//! Loading template lists from YAML or JSON.
//!
//! The expected shape is a sequence of single-key maps, the key being the
//! template name:
//!
//! ```yaml
//! - timestamps:
//!     match: "*_ts"
//!     mapping: { type: date, format: epoch_millis }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{info, warn};

use super::{DynamicTemplate, TemplateDef, TemplateRegistry};
use crate::error::{MappingError, Result};

type RawTemplates = Vec<IndexMap<String, TemplateDef>>;

impl TemplateRegistry {
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let raw: RawTemplates = serde_yaml::from_str(source)?;
        Self::from_raw(raw)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let raw: RawTemplates = serde_json::from_str(source)?;
        Self::from_raw(raw)
    }

    /// Load a template file; `.json` files are read as JSON, everything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        let registry = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&source)?,
            _ => Self::from_yaml_str(&source)?,
        };
        info!(path = %path.display(), templates = registry.len(), "loaded dynamic templates");
        Ok(registry)
    }

    fn from_raw(raw: RawTemplates) -> Result<Self> {
        let mut templates = Vec::with_capacity(raw.len());
        let mut seen = HashSet::new();
        for (index, entry) in raw.into_iter().enumerate() {
            if entry.len() != 1 {
                return Err(MappingError::InvalidTemplate {
                    template: format!("#{}", index),
                    reason: format!("expected exactly one template name, found {}", entry.len()),
                });
            }
            for (name, def) in entry {
                if !seen.insert(name.clone()) {
                    warn!(template = %name, "duplicate dynamic template name, earlier one wins");
                }
                templates.push(DynamicTemplate::new(&name, def)?);
            }
        }
        Ok(Self::new(templates))
    }
}
