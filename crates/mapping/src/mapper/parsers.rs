//! Registry of mapping types: turns a `{"type": ..., ...}` definition into a
//! [`MapperSpec`].

use std::collections::HashMap;
use std::fmt;

use dynamap_core::Dynamic;
use serde_json::{Map, Value};

use super::{FieldKind, MapperSpec, NumberKind};
use crate::context::IndexSettings;
use crate::date_format::DateFormat;
use crate::error::{MappingError, Result};

/// Ambient inputs available to a type parser.
#[derive(Clone, Copy)]
pub struct ParserContext<'a> {
    pub settings: &'a IndexSettings,
    /// Date format detected for the value being mapped, if any.
    pub date_format: Option<&'a DateFormat>,
    pub parsers: &'a TypeParsers,
}

/// Builds a spec for a field `name` from its mapping definition.
pub type TypeParser =
    dyn Fn(&str, &Map<String, Value>, &ParserContext<'_>) -> Result<MapperSpec> + Send + Sync;

/// Mapping type name → parser.
pub struct TypeParsers {
    parsers: HashMap<String, Box<TypeParser>>,
}

impl TypeParsers {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registry with every built-in mapping type.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("text", parse_text);
        registry.register("keyword", parse_keyword);
        registry.register("boolean", parse_boolean);
        registry.register("date", parse_date);
        registry.register("binary", parse_binary);
        registry.register("object", parse_object);
        for kind in NumberKind::ALL {
            registry.register(kind.as_str(), move |name, config, ctx| {
                parse_number(kind, name, config, ctx)
            });
        }
        registry
    }

    pub fn register<F>(&mut self, type_name: &str, parser: F)
    where
        F: Fn(&str, &Map<String, Value>, &ParserContext<'_>) -> Result<MapperSpec>
            + Send
            + Sync
            + 'static,
    {
        self.parsers.insert(type_name.to_string(), Box::new(parser));
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeParser> {
        self.parsers.get(type_name).map(|p| p.as_ref())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.parsers.contains_key(type_name)
    }
}

impl Default for TypeParsers {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for TypeParsers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.parsers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("TypeParsers").field("types", &names).finish()
    }
}

// ── Parameter helpers ───────────────────────────────────────────────

/// Keys every mapping type accepts without acting on them.
const COMMON_PARAMS: &[&str] = &["type", "index", "store", "doc_values"];

fn check_params(name: &str, config: &Map<String, Value>, allowed: &[&str]) -> Result<()> {
    for key in config.keys() {
        if !COMMON_PARAMS.contains(&key.as_str()) && !allowed.contains(&key.as_str()) {
            return Err(MappingError::invalid_mapping(
                name,
                format!("unknown parameter [{}]", key),
            ));
        }
    }
    Ok(())
}

fn bool_param(name: &str, config: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match config.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) if s == "true" => Ok(Some(true)),
        Some(Value::String(s)) if s == "false" => Ok(Some(false)),
        Some(other) => Err(MappingError::invalid_mapping(
            name,
            format!("[{}] must be a boolean, got {}", key, other),
        )),
    }
}

fn usize_param(name: &str, config: &Map<String, Value>, key: &str) -> Result<Option<usize>> {
    match config.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| {
                MappingError::invalid_mapping(name, format!("[{}] must be a non-negative integer", key))
            }),
        Some(Value::String(s)) => s.parse().map(Some).map_err(|_| {
            MappingError::invalid_mapping(name, format!("[{}] must be a non-negative integer", key))
        }),
        Some(other) => Err(MappingError::invalid_mapping(
            name,
            format!("[{}] must be a non-negative integer, got {}", key, other),
        )),
    }
}

fn str_param<'c>(name: &str, config: &'c Map<String, Value>, key: &str) -> Result<Option<&'c str>> {
    match config.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(MappingError::invalid_mapping(
            name,
            format!("[{}] must be a string, got {}", key, other),
        )),
    }
}

// ── Built-in parsers ────────────────────────────────────────────────

fn parse_text(name: &str, config: &Map<String, Value>, ctx: &ParserContext<'_>) -> Result<MapperSpec> {
    check_params(name, config, &["analyzer", "fields"])?;
    let analyzer = str_param(name, config, "analyzer")?
        .map(String::from)
        .unwrap_or_else(|| ctx.settings.default_analyzer.clone());
    let mut spec = MapperSpec::field(name, FieldKind::Text { analyzer });
    for (sub_name, sub_kind) in parse_multi_fields(name, config, ctx)? {
        spec = spec.with_multi_field(&sub_name, sub_kind);
    }
    Ok(spec)
}

fn parse_keyword(name: &str, config: &Map<String, Value>, ctx: &ParserContext<'_>) -> Result<MapperSpec> {
    check_params(name, config, &["ignore_above", "fields"])?;
    let ignore_above = usize_param(name, config, "ignore_above")?;
    let mut spec = MapperSpec::field(name, FieldKind::Keyword { ignore_above });
    for (sub_name, sub_kind) in parse_multi_fields(name, config, ctx)? {
        spec = spec.with_multi_field(&sub_name, sub_kind);
    }
    Ok(spec)
}

fn parse_multi_fields(
    name: &str,
    config: &Map<String, Value>,
    ctx: &ParserContext<'_>,
) -> Result<Vec<(String, FieldKind)>> {
    let Some(fields) = config.get("fields") else {
        return Ok(Vec::new());
    };
    let fields = fields
        .as_object()
        .ok_or_else(|| MappingError::invalid_mapping(name, "[fields] must be an object"))?;

    let mut out = Vec::with_capacity(fields.len());
    for (sub_name, sub_config) in fields {
        let sub_config = sub_config.as_object().ok_or_else(|| {
            MappingError::invalid_mapping(name, format!("multi-field [{}] must be an object", sub_name))
        })?;
        let sub_type = str_param(sub_name, sub_config, "type")?.ok_or_else(|| {
            MappingError::invalid_mapping(name, format!("multi-field [{}] has no type", sub_name))
        })?;
        let parser = ctx
            .parsers
            .get(sub_type)
            .ok_or_else(|| MappingError::UnknownMappingType {
                field: format!("{}.{}", name, sub_name),
                mapping_type: sub_type.to_string(),
            })?;
        let (_, kind) = parser(sub_name, sub_config, ctx)?.into_leaf_kind()?;
        out.push((sub_name.clone(), kind));
    }
    Ok(out)
}

fn parse_number(
    kind: NumberKind,
    name: &str,
    config: &Map<String, Value>,
    ctx: &ParserContext<'_>,
) -> Result<MapperSpec> {
    check_params(name, config, &["ignore_malformed", "coerce"])?;
    Ok(MapperSpec::field(
        name,
        FieldKind::Number {
            number_type: kind,
            ignore_malformed: bool_param(name, config, "ignore_malformed")?
                .unwrap_or(ctx.settings.ignore_malformed),
            coerce: bool_param(name, config, "coerce")?.unwrap_or(true),
        },
    ))
}

fn parse_boolean(name: &str, config: &Map<String, Value>, _ctx: &ParserContext<'_>) -> Result<MapperSpec> {
    check_params(name, config, &[])?;
    Ok(MapperSpec::field(name, FieldKind::Boolean))
}

fn parse_binary(name: &str, config: &Map<String, Value>, _ctx: &ParserContext<'_>) -> Result<MapperSpec> {
    check_params(name, config, &[])?;
    Ok(MapperSpec::field(name, FieldKind::Binary))
}

/// An explicit `format` wins over the detected one, which wins over the default.
fn parse_date(name: &str, config: &Map<String, Value>, ctx: &ParserContext<'_>) -> Result<MapperSpec> {
    check_params(name, config, &["format", "ignore_malformed"])?;
    let format = match str_param(name, config, "format")? {
        Some(spec) => DateFormat::parse_spec(spec)
            .map_err(|e| MappingError::invalid_mapping(name, e.to_string()))?,
        None => ctx
            .date_format
            .cloned()
            .unwrap_or_else(DateFormat::mapping_default),
    };
    Ok(MapperSpec::field(
        name,
        FieldKind::Date {
            format,
            ignore_malformed: bool_param(name, config, "ignore_malformed")?
                .unwrap_or(ctx.settings.ignore_malformed),
            index_version: ctx.settings.version_created,
        },
    ))
}

fn parse_object(name: &str, config: &Map<String, Value>, ctx: &ParserContext<'_>) -> Result<MapperSpec> {
    check_params(name, config, &["enabled", "dynamic"])?;
    let dynamic = match config.get("dynamic") {
        None => None,
        Some(Value::Bool(true)) => Some(Dynamic::True),
        Some(Value::Bool(false)) => Some(Dynamic::False),
        Some(Value::String(s)) => Some(
            s.parse::<Dynamic>()
                .map_err(|e| MappingError::invalid_mapping(name, e.to_string()))?,
        ),
        Some(other) => {
            return Err(MappingError::invalid_mapping(
                name,
                format!("[dynamic] must be a boolean or string, got {}", other),
            ))
        }
    };
    Ok(MapperSpec::Object {
        name: name.to_string(),
        enabled: bool_param(name, config, "enabled")?.unwrap_or(true),
        dynamic,
        index_version: ctx.settings.version_created,
    })
}
