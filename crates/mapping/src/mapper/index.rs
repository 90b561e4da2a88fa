//! Turning raw tokens into indexed values for a built field mapper.

use dynamap_core::{IndexedValue, ParsedDocument, RawValue};

use super::{FieldKind, FieldMapper, NumberKind};
use crate::error::{MappingError, Result};

impl FieldMapper {
    /// Index `value` into `doc` under this mapper's path, then under every
    /// multi-field.
    ///
    /// Null tokens index nothing. Values that do not fit the field are
    /// recorded as ignored when the field tolerates malformed input, and are
    /// an error otherwise.
    pub fn index_value(&self, value: &RawValue, doc: &mut ParsedDocument) -> Result<()> {
        if matches!(value, RawValue::Null) {
            return Ok(());
        }
        match self.convert(value) {
            Ok(Some(indexed)) => doc.add(self.full_path.as_str(), indexed),
            Ok(None) => doc.add_ignored(self.full_path.as_str()),
            Err(reason) if self.ignores_malformed() => {
                tracing::trace!(field = %self.full_path, %reason, "ignoring malformed value");
                doc.add_ignored(self.full_path.as_str());
            }
            Err(reason) => return Err(MappingError::malformed(&self.full_path, reason)),
        }
        for sub in &self.multi_fields {
            sub.index_value(value, doc)?;
        }
        Ok(())
    }

    fn ignores_malformed(&self) -> bool {
        match &self.kind {
            FieldKind::Number {
                ignore_malformed, ..
            }
            | FieldKind::Date {
                ignore_malformed, ..
            } => *ignore_malformed,
            _ => false,
        }
    }

    /// `Ok(None)` means the value is valid but deliberately not indexed.
    fn convert(&self, value: &RawValue) -> std::result::Result<Option<IndexedValue>, String> {
        match &self.kind {
            FieldKind::Text { .. } => scalar_text(value).map(|t| Some(IndexedValue::Text(t))),
            FieldKind::Keyword { ignore_above } => {
                let text = scalar_text(value)?;
                match ignore_above {
                    Some(limit) if text.chars().count() > *limit => Ok(None),
                    _ => Ok(Some(IndexedValue::Keyword(text))),
                }
            }
            FieldKind::Number {
                number_type,
                coerce,
                ..
            } => convert_number(value, *number_type, *coerce).map(Some),
            FieldKind::Boolean => convert_boolean(value).map(Some),
            FieldKind::Date { format, .. } => {
                let text = value
                    .text()
                    .ok_or_else(|| format!("expected a date, found {}", token_name(value)))?;
                format
                    .parse_millis(text)
                    .map(|millis| Some(IndexedValue::Date(millis)))
                    .ok_or_else(|| {
                        format!("failed to parse date [{}] with format [{}]", text, format)
                    })
            }
            FieldKind::Binary => match value {
                RawValue::Binary(bytes) => Ok(Some(IndexedValue::Binary(bytes.clone()))),
                other => Err(format!("expected binary, found {}", token_name(other))),
            },
        }
    }
}

fn token_name(value: &RawValue) -> &'static str {
    match value {
        RawValue::String(_) => "a string",
        RawValue::Number { .. } => "a number",
        RawValue::Boolean(_) => "a boolean",
        RawValue::Binary(_) => "binary data",
        RawValue::Null => "null",
        RawValue::Other(_) => "an unsupported token",
    }
}

fn scalar_text(value: &RawValue) -> std::result::Result<String, String> {
    match value {
        RawValue::String(s) => Ok(s.clone()),
        RawValue::Number { text, .. } => Ok(text.clone()),
        RawValue::Boolean(b) => Ok(b.to_string()),
        other => Err(format!("expected a string, found {}", token_name(other))),
    }
}

fn convert_boolean(value: &RawValue) -> std::result::Result<IndexedValue, String> {
    match value {
        RawValue::Boolean(b) => Ok(IndexedValue::Boolean(*b)),
        RawValue::String(s) if s == "true" => Ok(IndexedValue::Boolean(true)),
        RawValue::String(s) if s == "false" || s.is_empty() => Ok(IndexedValue::Boolean(false)),
        RawValue::String(s) => Err(format!(
            "failed to parse value [{}] as only [true] or [false] are allowed",
            s
        )),
        other => Err(format!("expected a boolean, found {}", token_name(other))),
    }
}

fn convert_number(
    value: &RawValue,
    number_type: NumberKind,
    coerce: bool,
) -> std::result::Result<IndexedValue, String> {
    let text = match value {
        RawValue::Number { text, .. } => text.as_str(),
        RawValue::String(s) if coerce => s.trim(),
        RawValue::String(s) => {
            return Err(format!("[{}] is a string and coercion is disabled", s));
        }
        other => return Err(format!("expected a number, found {}", token_name(other))),
    };

    match number_type.integral_range() {
        Some((min, max)) => {
            let out_of_range = || format!("[{}] is out of range for a {}", text, number_type);
            let parsed = match text.parse::<i128>() {
                Ok(v) => i64::try_from(v).map_err(|_| out_of_range())?,
                Err(_) => {
                    let f: f64 = text
                        .parse()
                        .map_err(|_| format!("[{}] is not a number", text))?;
                    if !coerce || !f.is_finite() || f.fract() != 0.0 {
                        return Err(format!("[{}] is not an integer value", text));
                    }
                    // i64::MAX rounds up to 2^63 as an f64, so the upper bound is exclusive.
                    if f < i64::MIN as f64 || f >= -(i64::MIN as f64) {
                        return Err(out_of_range());
                    }
                    f as i64
                }
            };
            if parsed < min || parsed > max {
                return Err(out_of_range());
            }
            Ok(IndexedValue::Long(parsed))
        }
        None => {
            let f: f64 = text
                .parse()
                .map_err(|_| format!("[{}] is not a number", text))?;
            if !f.is_finite() {
                return Err(format!("[{}] is not a finite number", text));
            }
            match number_type {
                NumberKind::Double => Ok(IndexedValue::Double(f)),
                _ => {
                    let narrowed = f as f32;
                    if narrowed.is_finite() {
                        Ok(IndexedValue::Float(narrowed))
                    } else {
                        Err(format!("[{}] is out of range for a {}", text, number_type))
                    }
                }
            }
        }
    }
}
