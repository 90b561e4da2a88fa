//! Immutable field and object mappers.
//!
//! A [`MapperSpec`] is the unbuilt, path-independent description returned by
//! type parsers and dynamic strategies; [`MapperSpec::build`] places it under
//! a [`ContentPath`] and yields the final [`Mapper`].

mod index;
mod parsers;

#[cfg(test)]
mod tests;

pub use parsers::{ParserContext, TypeParser, TypeParsers};

use std::fmt;
use std::str::FromStr;

use dynamap_core::Dynamic;
use serde_json::{json, Map, Value};

use crate::date_format::DateFormat;
use crate::error::{MappingError, Result};
use crate::path::ContentPath;

/// Length cap of the exact-match sub-field added to dynamic strings.
pub const KEYWORD_IGNORE_ABOVE: usize = 256;

/// Name of the exact-match sub-field added to dynamic strings.
pub const KEYWORD_SUBFIELD: &str = "keyword";

// ── Field kinds ─────────────────────────────────────────────────────

/// Numeric field flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    HalfFloat,
}

impl NumberKind {
    pub const ALL: [NumberKind; 7] = [
        NumberKind::Long,
        NumberKind::Integer,
        NumberKind::Short,
        NumberKind::Byte,
        NumberKind::Double,
        NumberKind::Float,
        NumberKind::HalfFloat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NumberKind::Long => "long",
            NumberKind::Integer => "integer",
            NumberKind::Short => "short",
            NumberKind::Byte => "byte",
            NumberKind::Double => "double",
            NumberKind::Float => "float",
            NumberKind::HalfFloat => "half_float",
        }
    }

    /// Inclusive value range of the integral kinds, `None` for floating ones.
    pub fn integral_range(self) -> Option<(i64, i64)> {
        match self {
            NumberKind::Long => Some((i64::MIN, i64::MAX)),
            NumberKind::Integer => Some((i32::MIN as i64, i32::MAX as i64)),
            NumberKind::Short => Some((i16::MIN as i64, i16::MAX as i64)),
            NumberKind::Byte => Some((i8::MIN as i64, i8::MAX as i64)),
            NumberKind::Double | NumberKind::Float | NumberKind::HalfFloat => None,
        }
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NumberKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NumberKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown number type: '{}'", s))
    }
}

/// What a leaf field indexes and how.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Analyzed full text.
    Text { analyzer: String },
    /// Exact match; values longer than `ignore_above` characters are skipped.
    Keyword { ignore_above: Option<usize> },
    Number {
        number_type: NumberKind,
        ignore_malformed: bool,
        coerce: bool,
    },
    Boolean,
    /// Millisecond-resolution date.
    Date {
        format: DateFormat,
        ignore_malformed: bool,
        index_version: u32,
    },
    Binary,
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "text",
            FieldKind::Keyword { .. } => "keyword",
            FieldKind::Number { number_type, .. } => number_type.as_str(),
            FieldKind::Boolean => "boolean",
            FieldKind::Date { .. } => "date",
            FieldKind::Binary => "binary",
        }
    }

    fn to_json(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("type".to_string(), json!(self.type_name()));
        match self {
            FieldKind::Text { analyzer } => {
                out.insert("analyzer".to_string(), json!(analyzer));
            }
            FieldKind::Keyword {
                ignore_above: Some(limit),
            } => {
                out.insert("ignore_above".to_string(), json!(limit));
            }
            FieldKind::Number {
                ignore_malformed: true,
                ..
            } => {
                out.insert("ignore_malformed".to_string(), json!(true));
            }
            FieldKind::Date {
                format,
                ignore_malformed,
                ..
            } => {
                out.insert("format".to_string(), json!(format.spec()));
                if *ignore_malformed {
                    out.insert("ignore_malformed".to_string(), json!(true));
                }
            }
            _ => {}
        }
        out
    }
}

// ── Built mappers ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapper {
    /// Local name within the enclosing object.
    pub name: String,
    pub full_path: String,
    pub kind: FieldKind,
    /// Sub-fields indexing the same value differently (`title.keyword`).
    pub multi_fields: Vec<FieldMapper>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMapper {
    pub name: String,
    pub full_path: String,
    pub enabled: bool,
    /// Policy for unknown children; `None` inherits from the parent.
    pub dynamic: Option<Dynamic>,
    pub index_version: u32,
}

/// A built mapper for one path.
#[derive(Debug, Clone, PartialEq)]
pub enum Mapper {
    Field(FieldMapper),
    Object(ObjectMapper),
}

impl Mapper {
    pub fn name(&self) -> &str {
        match self {
            Mapper::Field(f) => &f.name,
            Mapper::Object(o) => &o.name,
        }
    }

    pub fn full_path(&self) -> &str {
        match self {
            Mapper::Field(f) => &f.full_path,
            Mapper::Object(o) => &o.full_path,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Mapper::Field(f) => f.kind.type_name(),
            Mapper::Object(_) => "object",
        }
    }

    pub fn as_field(&self) -> Option<&FieldMapper> {
        match self {
            Mapper::Field(f) => Some(f),
            Mapper::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectMapper> {
        match self {
            Mapper::Object(o) => Some(o),
            Mapper::Field(_) => None,
        }
    }

    /// Mapping definition of this mapper alone (children of objects are not included).
    pub fn to_json(&self) -> Value {
        match self {
            Mapper::Field(f) => {
                let mut out = f.kind.to_json();
                if !f.multi_fields.is_empty() {
                    let fields: Map<String, Value> = f
                        .multi_fields
                        .iter()
                        .map(|sub| (sub.name.clone(), Value::Object(sub.kind.to_json())))
                        .collect();
                    out.insert("fields".to_string(), Value::Object(fields));
                }
                Value::Object(out)
            }
            Mapper::Object(o) => {
                let mut out = Map::new();
                if !o.enabled {
                    out.insert("enabled".to_string(), json!(false));
                }
                if let Some(dynamic) = o.dynamic {
                    out.insert("dynamic".to_string(), json!(dynamic.to_string()));
                }
                out.insert("properties".to_string(), Value::Object(Map::new()));
                Value::Object(out)
            }
        }
    }
}

// ── Unbuilt specs ───────────────────────────────────────────────────

/// Path-independent description of a mapper, ready to be built.
#[derive(Debug, Clone, PartialEq)]
pub enum MapperSpec {
    Field {
        name: String,
        kind: FieldKind,
        multi_fields: Vec<(String, FieldKind)>,
    },
    Object {
        name: String,
        enabled: bool,
        dynamic: Option<Dynamic>,
        index_version: u32,
    },
}

impl MapperSpec {
    pub fn field(name: &str, kind: FieldKind) -> Self {
        MapperSpec::Field {
            name: name.to_string(),
            kind,
            multi_fields: Vec::new(),
        }
    }

    /// Enabled object with an inherited dynamic policy.
    pub fn object(name: &str, index_version: u32) -> Self {
        MapperSpec::Object {
            name: name.to_string(),
            enabled: true,
            dynamic: None,
            index_version,
        }
    }

    pub fn with_multi_field(mut self, sub_name: &str, sub_kind: FieldKind) -> Self {
        if let MapperSpec::Field { multi_fields, .. } = &mut self {
            multi_fields.push((sub_name.to_string(), sub_kind));
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            MapperSpec::Field { name, .. } | MapperSpec::Object { name, .. } => name,
        }
    }

    /// Place the spec under `path` and produce the immutable mapper.
    pub fn build(&self, path: &ContentPath) -> Mapper {
        match self {
            MapperSpec::Field {
                name,
                kind,
                multi_fields,
            } => {
                let full_path = path.path_as_text(name);
                let multi_fields = multi_fields
                    .iter()
                    .map(|(sub, sub_kind)| FieldMapper {
                        name: sub.clone(),
                        full_path: format!("{}.{}", full_path, sub),
                        kind: sub_kind.clone(),
                        multi_fields: Vec::new(),
                    })
                    .collect();
                Mapper::Field(FieldMapper {
                    name: name.clone(),
                    full_path,
                    kind: kind.clone(),
                    multi_fields,
                })
            }
            MapperSpec::Object {
                name,
                enabled,
                dynamic,
                index_version,
            } => Mapper::Object(ObjectMapper {
                name: name.clone(),
                full_path: path.path_as_text(name),
                enabled: *enabled,
                dynamic: *dynamic,
                index_version: *index_version,
            }),
        }
    }

    /// Leaf kind of a field spec, rejecting objects used where a leaf is required.
    pub(crate) fn into_leaf_kind(self) -> Result<(String, FieldKind)> {
        match self {
            MapperSpec::Field { name, kind, .. } => Ok((name, kind)),
            MapperSpec::Object { name, .. } => Err(MappingError::invalid_mapping(
                &name,
                "an object mapping cannot be used as a multi-field",
            )),
        }
    }
}
