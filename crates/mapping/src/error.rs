//! Error type shared by every stage of dynamic mapping.

use dynamap_core::CoreError;

/// Errors raised while inferring, building or indexing dynamic fields.
///
/// Parse failures of candidate literals during type detection are not
/// errors; they only steer classification and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// The tokenizer declared a numeric subtype without a classification rule.
    #[error("unable to parse number of type [{0}]")]
    UnsupportedNumberType(String),

    /// A dynamic template resolved to a mapping type nobody can build.
    #[error("failed to find type parser [{mapping_type}] for [{field}]")]
    UnknownMappingType { field: String, mapping_type: String },

    /// A mapping definition could not be turned into a mapper.
    #[error("invalid mapping for [{field}]: {reason}")]
    InvalidMapping { field: String, reason: String },

    /// A dynamic template definition is unusable.
    #[error("invalid dynamic template [{template}]: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("invalid date format [{format}]: {reason}")]
    InvalidDateFormat { format: String, reason: String },

    /// A value did not fit its field and the field does not ignore malformed values.
    #[error("failed to parse field [{field}]: {reason}")]
    Malformed { field: String, reason: String },

    /// An unknown field appeared under a `strict` container.
    #[error("mapping set to strict, dynamic introduction of [{path}] is not allowed")]
    StrictDynamic { path: String },

    /// Two mapping updates disagree on the same path.
    #[error("mapper [{path}] cannot be changed from type [{existing}] to [{proposed}]")]
    MappingConflict {
        path: String,
        existing: String,
        proposed: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;

impl MappingError {
    pub(crate) fn invalid_mapping(field: &str, reason: impl Into<String>) -> Self {
        MappingError::InvalidMapping {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(field: &str, reason: impl Into<String>) -> Self {
        MappingError::Malformed {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
