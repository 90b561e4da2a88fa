//! The committed mapping of an index and the merge of dynamic updates
//! into it.

use dynamap_core::config::{MappingConfig, DEFAULT_DYNAMIC_DATE_FORMATS};
use dynamap_core::Dynamic;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::context::MappingRules;
use crate::error::{MappingError, Result};
use crate::mapper::Mapper;
use crate::parser::{DocumentParser, ParseOutcome};
use crate::runtime::RuntimeField;

/// Rules plus every mapper and runtime field committed so far, keyed by
/// full dotted path in insertion order.
#[derive(Debug)]
pub struct IndexMapping {
    rules: MappingRules,
    dynamic: Dynamic,
    mappers: IndexMap<String, Mapper>,
    runtime_fields: IndexMap<String, RuntimeField>,
}

impl IndexMapping {
    /// Empty mapping whose root container uses `dynamic`.
    pub fn new(rules: MappingRules, dynamic: Dynamic) -> Self {
        Self {
            rules,
            dynamic,
            mappers: IndexMap::new(),
            runtime_fields: IndexMap::new(),
        }
    }

    pub fn from_config(config: &MappingConfig) -> Result<Self> {
        Ok(Self::new(MappingRules::from_config(config)?, config.dynamic))
    }

    pub fn rules(&self) -> &MappingRules {
        &self.rules
    }

    /// Policy of the root container.
    pub fn dynamic(&self) -> Dynamic {
        self.dynamic
    }

    pub fn mapper(&self, full_path: &str) -> Option<&Mapper> {
        self.mappers.get(full_path)
    }

    pub fn runtime_field(&self, full_path: &str) -> Option<&RuntimeField> {
        self.runtime_fields.get(full_path)
    }

    pub fn mappers(&self) -> impl Iterator<Item = &Mapper> {
        self.mappers.values()
    }

    pub fn runtime_fields(&self) -> impl Iterator<Item = &RuntimeField> {
        self.runtime_fields.values()
    }

    /// Parse one document against the current snapshot.
    pub fn parse(&self, source: &Value) -> Result<ParseOutcome> {
        DocumentParser::new(self).parse(source)
    }

    /// Commit the updates a parse proposed. See [`IndexMapping::merge_updates`].
    pub fn merge(&mut self, outcome: &ParseOutcome) -> Result<usize> {
        self.merge_updates(&outcome.mappers, &outcome.runtime_fields)
    }

    /// Add mappers and runtime fields, returning how many were new.
    ///
    /// An update identical to what is already mapped is a no-op. Any
    /// difference at the same path is a [`MappingError::MappingConflict`]
    /// and leaves the mapping untouched: the whole batch is checked before
    /// anything is inserted.
    pub fn merge_updates(&mut self, mappers: &[Mapper], runtime_fields: &[RuntimeField]) -> Result<usize> {
        let mut new_mappers: IndexMap<&str, &Mapper> = IndexMap::new();
        for mapper in mappers {
            let path = mapper.full_path();
            match self.mappers.get(path).or_else(|| new_mappers.get(path).copied()) {
                Some(existing) if existing == mapper => continue,
                Some(existing) => return Err(mapper_conflict(path, existing, mapper)),
                None => {}
            }
            if let Some(runtime) = self.runtime_fields.get(path) {
                return Err(conflict(path, runtime_label(runtime), mapper.type_name().to_string()));
            }
            new_mappers.insert(path, mapper);
        }

        let mut new_runtime: IndexMap<&str, &RuntimeField> = IndexMap::new();
        for field in runtime_fields {
            let path = field.name.as_str();
            match self.runtime_fields.get(path).or_else(|| new_runtime.get(path).copied()) {
                Some(existing) if existing == field => continue,
                Some(existing) => {
                    return Err(conflict(path, runtime_label(existing), runtime_label(field)))
                }
                None => {}
            }
            if let Some(mapper) = self.mappers.get(path).or_else(|| new_mappers.get(path).copied()) {
                return Err(conflict(path, mapper.type_name().to_string(), runtime_label(field)));
            }
            new_runtime.insert(path, field);
        }

        let added = new_mappers.len() + new_runtime.len();
        for (path, mapper) in new_mappers {
            debug!(path, mapping_type = mapper.type_name(), "mapper committed");
            self.mappers.insert(path.to_string(), mapper.clone());
        }
        for (path, field) in new_runtime {
            debug!(path, runtime_type = field.type_name(), "runtime field committed");
            self.runtime_fields.insert(path.to_string(), field.clone());
        }
        if added > 0 {
            info!(
                added,
                mappers = self.mappers.len(),
                runtime_fields = self.runtime_fields.len(),
                "mapping updated"
            );
        }
        Ok(added)
    }

    /// The mapping as a JSON document: root settings that differ from the
    /// defaults, templates, the nested `properties` tree and `runtime`.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("dynamic".to_string(), json!(self.dynamic.to_string()));

        let detection = &self.rules.detection;
        if !detection.date_detection {
            out.insert("date_detection".to_string(), json!(false));
        }
        if detection.numeric_detection {
            out.insert("numeric_detection".to_string(), json!(true));
        }
        let formats: Vec<&str> = detection.date_formats.iter().map(|f| f.spec()).collect();
        if formats != DEFAULT_DYNAMIC_DATE_FORMATS {
            out.insert("dynamic_date_formats".to_string(), json!(formats));
        }
        if !self.rules.templates.is_empty() {
            out.insert("dynamic_templates".to_string(), self.rules.templates.to_json());
        }

        out.insert("properties".to_string(), Value::Object(self.properties(None)));

        if !self.runtime_fields.is_empty() {
            let runtime: Map<String, Value> = self
                .runtime_fields
                .iter()
                .map(|(path, field)| (path.clone(), field.to_json()))
                .collect();
            out.insert("runtime".to_string(), Value::Object(runtime));
        }
        Value::Object(out)
    }

    /// Children of the object at `parent` (`None` for the root).
    fn properties(&self, parent: Option<&str>) -> Map<String, Value> {
        self.mappers
            .values()
            .filter(|m| parent_path(m) == parent)
            .map(|m| {
                let mut json = m.to_json();
                if let Mapper::Object(object) = m {
                    json["properties"] = Value::Object(self.properties(Some(&object.full_path)));
                }
                (m.name().to_string(), json)
            })
            .collect()
    }
}

fn parent_path(mapper: &Mapper) -> Option<&str> {
    mapper
        .full_path()
        .strip_suffix(mapper.name())
        .and_then(|prefix| prefix.strip_suffix('.'))
}

fn runtime_label(field: &RuntimeField) -> String {
    format!("runtime {}", field.type_name())
}

fn conflict(path: &str, existing: String, proposed: String) -> MappingError {
    MappingError::MappingConflict {
        path: path.to_string(),
        existing,
        proposed,
    }
}

/// Same-typed mappers that differ in parameters report their definitions.
fn mapper_conflict(path: &str, existing: &Mapper, proposed: &Mapper) -> MappingError {
    if existing.type_name() == proposed.type_name() {
        conflict(path, existing.to_json().to_string(), proposed.to_json().to_string())
    } else {
        conflict(
            path,
            existing.type_name().to_string(),
            proposed.type_name().to_string(),
        )
    }
}
