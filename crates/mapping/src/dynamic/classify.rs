//! Type detection for values of fields that are not mapped yet.
//!
//! Classification is a pure function of the token and the detection policy:
//! documents parsed concurrently that see the same literal under the same
//! policy always propose the same type.

use dynamap_core::{NumberType, RawValue};
use tracing::trace;

use crate::context::DetectionPolicy;
use crate::date_format::DateFormat;
use crate::error::{MappingError, Result};
use crate::template::MatchType;

/// Semantic type inferred for a new leaf value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InferredType<'a> {
    String,
    Long,
    Double,
    Boolean,
    /// Carries the configured format that parsed the value.
    Date(&'a DateFormat),
    Binary,
}

impl<'a> InferredType<'a> {
    pub fn match_type(&self) -> MatchType {
        match self {
            InferredType::String => MatchType::String,
            InferredType::Long => MatchType::Long,
            InferredType::Double => MatchType::Double,
            InferredType::Boolean => MatchType::Boolean,
            InferredType::Date(_) => MatchType::Date,
            InferredType::Binary => MatchType::Binary,
        }
    }

    pub fn date_format(&self) -> Option<&'a DateFormat> {
        match *self {
            InferredType::Date(format) => Some(format),
            _ => None,
        }
    }
}

/// Outcome of looking at a token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification<'a> {
    Inferred(InferredType<'a>),
    /// No type rule applies; only a matching string template may create a field.
    TemplateOnly,
}

/// Classify a token under `policy`.
///
/// Fails only for number tokens whose declared subtype has no rule.
pub fn classify<'a>(value: &RawValue, policy: &'a DetectionPolicy) -> Result<Classification<'a>> {
    let inferred = match value {
        RawValue::String(text) => classify_text(text, policy),
        RawValue::Number { number_type, .. } => classify_number(*number_type)?,
        RawValue::Boolean(_) => InferredType::Boolean,
        RawValue::Binary(_) => InferredType::Binary,
        RawValue::Null | RawValue::Other(_) => return Ok(Classification::TemplateOnly),
    };
    Ok(Classification::Inferred(inferred))
}

fn classify_number(number_type: NumberType) -> Result<InferredType<'static>> {
    match number_type {
        NumberType::Int | NumberType::Long | NumberType::BigInteger => Ok(InferredType::Long),
        NumberType::Float | NumberType::Double | NumberType::BigDecimal => Ok(InferredType::Double),
        other => Err(MappingError::UnsupportedNumberType(format!("{:?}", other))),
    }
}

/// Classify a string literal.
///
/// Purely numeric strings never reach date detection: formats such as
/// `epoch_millis` or a bare year would accept almost any of them.
pub fn classify_text<'a>(text: &str, policy: &'a DetectionPolicy) -> InferredType<'a> {
    let is_long = try_parse_long(text).is_some();
    let is_double = try_parse_double(text).is_some();

    if is_long && policy.numeric_detection {
        InferredType::Long
    } else if is_double && policy.numeric_detection {
        InferredType::Double
    } else if !is_long && !is_double && policy.date_detection {
        detect_date(text, &policy.date_formats)
            .map(InferredType::Date)
            .unwrap_or(InferredType::String)
    } else {
        InferredType::String
    }
}

/// First format, in declared order, that parses `text`.
pub fn detect_date<'a>(text: &str, formats: &'a [DateFormat]) -> Option<&'a DateFormat> {
    formats.iter().find(|format| {
        let parsed = format.parses(text);
        if !parsed {
            trace!(format = %format, "date candidate rejected");
        }
        parsed
    })
}

/// A 64-bit signed integer with an optional sign, digits only.
pub fn try_parse_long(text: &str) -> Option<i64> {
    text.parse().ok()
}

/// A decimal floating-point literal, or `NaN` / `Infinity` with an optional sign.
///
/// Surrounding whitespace and control characters are ignored, and a decimal
/// may end in a `d`/`D`/`f`/`F` type suffix (`"10d"`, `" 1.5f "`). Lowercase
/// `nan`, `inf`, hex literals and other spellings are not numbers here.
pub fn try_parse_double(text: &str) -> Option<f64> {
    let trimmed = text.trim_matches(|c: char| c <= ' ');
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if unsigned == "NaN" || unsigned == "Infinity" {
        return trimmed.parse().ok();
    }
    let literal = trimmed.strip_suffix(['d', 'D', 'f', 'F']).unwrap_or(trimmed);
    let digits = literal.strip_prefix(['+', '-']).unwrap_or(literal);
    let decimal = digits.bytes().any(|b| b.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if decimal {
        literal.parse().ok()
    } else {
        None
    }
}
