use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Per-container policy for fields that are not yet part of the mapping.
///
/// Decided by the caller for every object it walks; the dynamic field
/// engine only runs for `True` and `Runtime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dynamic {
    /// Unknown fields reject the whole document.
    Strict,
    /// Unknown fields are mapped as concrete, indexed fields.
    #[default]
    True,
    /// Unknown fields stay in the source but are neither mapped nor indexed.
    False,
    /// Unknown leaf fields are mapped as query-time runtime fields.
    Runtime,
}

impl fmt::Display for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Strict => write!(f, "strict"),
            Dynamic::True => write!(f, "true"),
            Dynamic::False => write!(f, "false"),
            Dynamic::Runtime => write!(f, "runtime"),
        }
    }
}

impl FromStr for Dynamic {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Dynamic::Strict),
            "true" => Ok(Dynamic::True),
            "false" => Ok(Dynamic::False),
            "runtime" => Ok(Dynamic::Runtime),
            other => Err(CoreError::Config(format!(
                "unknown dynamic policy: '{}' (expected strict, true, false or runtime)",
                other
            ))),
        }
    }
}
