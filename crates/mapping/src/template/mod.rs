//! Dynamic templates: ordered rules that override the default mapping of
//! newly seen fields by name, path and detected type.

mod glob;
mod loader;


pub use glob::simple_match;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MappingError, Result};

// ── Match type ──────────────────────────────────────────────────────

/// Type of a newly seen value as templates see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    String,
    Long,
    Double,
    Boolean,
    Date,
    Binary,
    Object,
}

impl MatchType {
    /// Mapping type used when a matching template does not name one.
    ///
    /// Detected doubles default to `float`.
    pub fn default_mapping_type(self) -> &'static str {
        match self {
            MatchType::String => "text",
            MatchType::Long => "long",
            MatchType::Double => "float",
            MatchType::Boolean => "boolean",
            MatchType::Date => "date",
            MatchType::Binary => "binary",
            MatchType::Object => "object",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::String => write!(f, "string"),
            MatchType::Long => write!(f, "long"),
            MatchType::Double => write!(f, "double"),
            MatchType::Boolean => write!(f, "boolean"),
            MatchType::Date => write!(f, "date"),
            MatchType::Binary => write!(f, "binary"),
            MatchType::Object => write!(f, "object"),
        }
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "string" => Ok(MatchType::String),
            "long" => Ok(MatchType::Long),
            "double" => Ok(MatchType::Double),
            "boolean" => Ok(MatchType::Boolean),
            "date" => Ok(MatchType::Date),
            "binary" => Ok(MatchType::Binary),
            "object" => Ok(MatchType::Object),
            other => Err(format!("unknown match_mapping_type: '{}'", other)),
        }
    }
}

// ── Template definition ─────────────────────────────────────────────

/// Serialized shape of one template body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateDef {
    /// Glob over the field's local name.
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmatch: Option<String>,
    /// Glob over the field's full dotted path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_match: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_unmatch: Option<String>,
    /// A [`MatchType`] name or `*`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_mapping_type: Option<String>,
    /// Only `simple` (wildcard) patterns are supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<String>,
    pub mapping: Map<String, Value>,
}

/// A validated, named template.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicTemplate {
    name: String,
    def: TemplateDef,
    /// `None` matches every type.
    match_type: Option<MatchType>,
}

impl DynamicTemplate {
    pub fn new(name: &str, def: TemplateDef) -> Result<Self> {
        let invalid = |reason: String| MappingError::InvalidTemplate {
            template: name.to_string(),
            reason,
        };

        match def.match_pattern.as_deref() {
            None | Some("simple") => {}
            Some(other) => {
                return Err(invalid(format!(
                    "unsupported match_pattern '{}', only 'simple' is available",
                    other
                )))
            }
        }

        let match_type = match def.match_mapping_type.as_deref() {
            None | Some("*") => None,
            Some(raw) => Some(raw.parse::<MatchType>().map_err(invalid)?),
        };

        if let Some(type_value) = def.mapping.get("type") {
            if !type_value.is_string() {
                return Err(invalid("mapping [type] must be a string".to_string()));
            }
        }

        Ok(Self {
            name: name.to_string(),
            def,
            match_type,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn def(&self) -> &TemplateDef {
        &self.def
    }

    /// Whether this template applies to a field at `full_path` named `name`
    /// whose value was detected as `match_type`.
    pub fn matches(&self, full_path: &str, name: &str, match_type: MatchType) -> bool {
        let def = &self.def;
        if let Some(p) = &def.path_match {
            if !simple_match(p, full_path) {
                return false;
            }
        }
        if let Some(p) = &def.match_name {
            if !simple_match(p, name) {
                return false;
            }
        }
        if let Some(p) = &def.path_unmatch {
            if simple_match(p, full_path) {
                return false;
            }
        }
        if let Some(p) = &def.unmatch {
            if simple_match(p, name) {
                return false;
            }
        }
        self.match_type.map_or(true, |t| t == match_type)
    }

    /// Mapping type the template asks for, `dynamic_type` when it names none.
    pub fn mapping_type(&self, dynamic_type: &str) -> String {
        let raw = self
            .def
            .mapping
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(dynamic_type);
        raw.replace("{dynamic_type}", dynamic_type)
            .replace("{dynamicType}", dynamic_type)
    }

    /// The template's mapping with `{name}` and `{dynamic_type}` placeholders
    /// filled in, keys included.
    pub fn mapping_for_name(&self, name: &str, dynamic_type: &str) -> Map<String, Value> {
        substitute_map(&self.def.mapping, name, dynamic_type)
    }
}

fn substitute_str(s: &str, name: &str, dynamic_type: &str) -> String {
    s.replace("{name}", name)
        .replace("{dynamic_type}", dynamic_type)
        .replace("{dynamicType}", dynamic_type)
}

fn substitute_map(map: &Map<String, Value>, name: &str, dynamic_type: &str) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| {
            (
                substitute_str(k, name, dynamic_type),
                substitute_value(v, name, dynamic_type),
            )
        })
        .collect()
}

fn substitute_value(value: &Value, name: &str, dynamic_type: &str) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_str(s, name, dynamic_type)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| substitute_value(v, name, dynamic_type))
                .collect(),
        ),
        Value::Object(map) => Value::Object(substitute_map(map, name, dynamic_type)),
        other => other.clone(),
    }
}

// ── Registry ────────────────────────────────────────────────────────

/// Ordered, read-only list of templates; the first match wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateRegistry {
    templates: Vec<DynamicTemplate>,
}

impl TemplateRegistry {
    pub fn new(templates: Vec<DynamicTemplate>) -> Self {
        Self { templates }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// First template, in registration order, accepting the field.
    pub fn find(&self, full_path: &str, name: &str, match_type: MatchType) -> Option<&DynamicTemplate> {
        self.templates
            .iter()
            .find(|t| t.matches(full_path, name, match_type))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DynamicTemplate> {
        self.templates.iter()
    }

    /// Serialized form: `[{name: {...}}, ...]`.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.templates
                .iter()
                .map(|t| {
                    let mut entry = Map::new();
                    entry.insert(
                        t.name.clone(),
                        serde_json::to_value(&t.def).unwrap_or(Value::Null),
                    );
                    Value::Object(entry)
                })
                .collect(),
        )
    }
}
