use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a parsed document.
pub type DocId = Uuid;

/// Numeric subtype declared by the token stream for a number token.
///
/// Marked non-exhaustive: token streams for other content formats may grow
/// subtypes that the mapping layer has no rule for.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberType {
    Int,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
}

/// A single scalar token as delivered by the document tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// A string literal.
    String(String),
    /// A number, kept in its literal form together with the declared subtype.
    Number { text: String, number_type: NumberType },
    Boolean(bool),
    /// Raw bytes embedded in a binary content format.
    Binary(Vec<u8>),
    Null,
    /// Any other scalar token kind (named by the tokenizer) with no type rule.
    Other(String),
}

impl RawValue {
    pub fn string(text: impl Into<String>) -> Self {
        RawValue::String(text.into())
    }

    pub fn number(text: impl Into<String>, number_type: NumberType) -> Self {
        RawValue::Number {
            text: text.into(),
            number_type,
        }
    }

    /// Literal text of string and number tokens, `None` for everything else.
    pub fn text(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s.as_str()),
            RawValue::Number { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }

    /// Convert a scalar JSON value into a token. Arrays and objects are not
    /// scalars and return `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<RawValue> {
        match value {
            serde_json::Value::Null => Some(RawValue::Null),
            serde_json::Value::Bool(b) => Some(RawValue::Boolean(*b)),
            serde_json::Value::String(s) => Some(RawValue::String(s.clone())),
            serde_json::Value::Number(n) => Some(RawValue::from_json_number(n)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    fn from_json_number(n: &serde_json::Number) -> RawValue {
        let number_type = if let Some(i) = n.as_i64() {
            if i32::try_from(i).is_ok() {
                NumberType::Int
            } else {
                NumberType::Long
            }
        } else if n.is_u64() {
            NumberType::BigInteger
        } else {
            NumberType::Double
        };
        RawValue::Number {
            text: n.to_string(),
            number_type,
        }
    }
}

/// A value as it ends up in the index for one field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum IndexedValue {
    /// Analyzed full-text value.
    Text(String),
    /// Exact-match value.
    Keyword(String),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    /// Milliseconds since the epoch, UTC.
    Date(i64),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedField {
    pub path: String,
    pub value: IndexedValue,
}

/// Output of parsing one source document: the indexed values plus the paths
/// whose values were skipped (malformed but tolerated, or over length caps).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub id: DocId,
    pub fields: Vec<IndexedField>,
    pub ignored: Vec<String>,
}

impl ParsedDocument {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: DocId) -> Self {
        Self {
            id,
            fields: Vec::new(),
            ignored: Vec::new(),
        }
    }

    pub fn add(&mut self, path: impl Into<String>, value: IndexedValue) {
        self.fields.push(IndexedField {
            path: path.into(),
            value,
        });
    }

    pub fn add_ignored(&mut self, path: impl Into<String>) {
        self.ignored.push(path.into());
    }

    /// All values indexed under `path`, in insertion order.
    pub fn values(&self, path: &str) -> Vec<&IndexedValue> {
        self.fields
            .iter()
            .filter(|f| f.path == path)
            .map(|f| &f.value)
            .collect()
    }
}

impl Default for ParsedDocument {
    fn default() -> Self {
        Self::new()
    }
}
