//! Query-time (runtime) field types.
//!
//! Runtime fields have no index footprint: they are evaluated from the stored
//! source when queried, so materializing one only records its name and type.

use serde_json::{json, Value};

use crate::date_format::DateFormat;

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeFieldKind {
    Keyword,
    Long,
    Double,
    Boolean,
    Date { format: DateFormat },
}

/// A runtime field bound to its fully qualified dotted name.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeField {
    pub name: String,
    pub kind: RuntimeFieldKind,
}

impl RuntimeField {
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            RuntimeFieldKind::Keyword => "keyword",
            RuntimeFieldKind::Long => "long",
            RuntimeFieldKind::Double => "double",
            RuntimeFieldKind::Boolean => "boolean",
            RuntimeFieldKind::Date { .. } => "date",
        }
    }

    pub fn to_json(&self) -> Value {
        match &self.kind {
            RuntimeFieldKind::Date { format } => {
                json!({ "type": self.type_name(), "format": format.spec() })
            }
            _ => json!({ "type": self.type_name() }),
        }
    }
}

/// Creates the runtime field types used for dynamically detected leaves.
///
/// Binary has no runtime representation, so there is no binary constructor.
pub trait RuntimeFieldFactory: Send + Sync {
    fn new_string_field(&self, full_name: &str) -> RuntimeField;
    fn new_long_field(&self, full_name: &str) -> RuntimeField;
    fn new_double_field(&self, full_name: &str) -> RuntimeField;
    fn new_boolean_field(&self, full_name: &str) -> RuntimeField;
    fn new_date_field(&self, full_name: &str, format: &DateFormat) -> RuntimeField;
}

/// Maps strings to `keyword` and every other kind to its namesake.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRuntimeFields;

impl DefaultRuntimeFields {
    fn field(full_name: &str, kind: RuntimeFieldKind) -> RuntimeField {
        RuntimeField {
            name: full_name.to_string(),
            kind,
        }
    }
}

impl RuntimeFieldFactory for DefaultRuntimeFields {
    fn new_string_field(&self, full_name: &str) -> RuntimeField {
        Self::field(full_name, RuntimeFieldKind::Keyword)
    }

    fn new_long_field(&self, full_name: &str) -> RuntimeField {
        Self::field(full_name, RuntimeFieldKind::Long)
    }

    fn new_double_field(&self, full_name: &str) -> RuntimeField {
        Self::field(full_name, RuntimeFieldKind::Double)
    }

    fn new_boolean_field(&self, full_name: &str) -> RuntimeField {
        Self::field(full_name, RuntimeFieldKind::Boolean)
    }

    fn new_date_field(&self, full_name: &str, format: &DateFormat) -> RuntimeField {
        Self::field(
            full_name,
            RuntimeFieldKind::Date {
                format: format.clone(),
            },
        )
    }
}
