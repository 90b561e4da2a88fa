//! Date format specs used by date detection and date mappers.
//!
//! A spec is one or more alternatives joined by `||`. Each alternative is
//! either a built-in name (`strict_date_optional_time`, `epoch_millis`, ...)
//! or a letter pattern such as `yyyy/MM/dd HH:mm:ss`. Parsing tries the
//! alternatives in order and the first success wins.

mod pattern;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{MappingError, Result};

/// Format given to date mappers that neither a template nor detection configured.
pub const DEFAULT_MAPPING_DATE_FORMAT: &str = "strict_date_optional_time||epoch_millis";

const ISO_DATE_OPTIONAL_TIME: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H",
    "%Y-%m-%d",
    "%Y-%m",
    "%Y",
];

const ISO_DATE_TIME: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%.fZ"];

const ISO_DATE_TIME_NO_MILLIS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%SZ"];

const ISO_DATE: &[&str] = &["%Y-%m-%d"];
const BASIC_DATE: &[&str] = &["%Y%m%d"];
const YEAR_MONTH: &[&str] = &["%Y-%m"];
const YEAR: &[&str] = &["%Y"];

/// One `||`-separated alternative of a date format spec.
#[derive(Debug, Clone)]
enum DateParser {
    /// Candidate strftime strings; any of them may match.
    Strftime(Vec<String>),
    EpochMillis,
    EpochSecond,
}

impl DateParser {
    fn from_alternative(alternative: &str) -> std::result::Result<Self, String> {
        let named: Option<&[&str]> = match alternative {
            "epoch_millis" => return Ok(DateParser::EpochMillis),
            "epoch_second" => return Ok(DateParser::EpochSecond),
            "strict_date_optional_time" | "date_optional_time" => Some(ISO_DATE_OPTIONAL_TIME),
            "strict_date_time" | "date_time" => Some(ISO_DATE_TIME),
            "strict_date_time_no_millis" | "date_time_no_millis" => Some(ISO_DATE_TIME_NO_MILLIS),
            "strict_date" | "date" => Some(ISO_DATE),
            "basic_date" => Some(BASIC_DATE),
            "strict_year_month" | "year_month" => Some(YEAR_MONTH),
            "strict_year" | "year" => Some(YEAR),
            _ => None,
        };
        match named {
            Some(formats) => Ok(DateParser::Strftime(
                formats.iter().map(|f| f.to_string()).collect(),
            )),
            None => Ok(DateParser::Strftime(vec![pattern::translate(alternative)?])),
        }
    }

    fn parse(&self, text: &str) -> Option<i64> {
        match self {
            DateParser::Strftime(formats) => formats
                .iter()
                .find_map(|fmt| pattern::parse_strftime(fmt, text)),
            DateParser::EpochMillis => pattern::parse_epoch(text, 1),
            DateParser::EpochSecond => pattern::parse_epoch(text, 1000),
        }
    }
}

/// A compiled date format spec. Two formats are equal when their specs are.
#[derive(Debug, Clone)]
pub struct DateFormat {
    spec: String,
    parsers: Vec<DateParser>,
}

impl DateFormat {
    /// Compile a format spec, rejecting empty alternatives and unknown pattern letters.
    pub fn parse_spec(spec: &str) -> Result<Self> {
        let invalid = |reason: String| MappingError::InvalidDateFormat {
            format: spec.to_string(),
            reason,
        };
        let mut parsers = Vec::new();
        for alternative in spec.split("||") {
            let alternative = alternative.trim();
            if alternative.is_empty() {
                return Err(invalid("empty format alternative".to_string()));
            }
            parsers.push(DateParser::from_alternative(alternative).map_err(invalid)?);
        }
        Ok(Self {
            spec: spec.to_string(),
            parsers,
        })
    }

    /// Format used by date mappers when nothing more specific is known.
    pub fn mapping_default() -> Self {
        Self::parse_spec(DEFAULT_MAPPING_DATE_FORMAT).expect("built-in date format compiles")
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// Parse `text` into epoch milliseconds (UTC), `None` if no alternative matches.
    pub fn parse_millis(&self, text: &str) -> Option<i64> {
        self.parsers.iter().find_map(|p| p.parse(text))
    }

    pub fn parses(&self, text: &str) -> bool {
        self.parse_millis(text).is_some()
    }
}

impl PartialEq for DateFormat {
    fn eq(&self, other: &Self) -> bool {
        self.spec == other.spec
    }
}

impl Eq for DateFormat {}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

impl FromStr for DateFormat {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_spec(s)
    }
}

impl Serialize for DateFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.spec)
    }
}

impl<'de> Deserialize<'de> for DateFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let spec = String::deserialize(deserializer)?;
        Self::parse_spec(&spec).map_err(serde::de::Error::custom)
    }
}
