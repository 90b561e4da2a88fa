use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dynamic::Dynamic;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Date formats tried, in order, when date detection sees an unknown string.
pub const DEFAULT_DYNAMIC_DATE_FORMATS: &[&str] =
    &["strict_date_optional_time", "yyyy/MM/dd HH:mm:ss||yyyy/MM/dd"];

/// Index version stamped on mappers when none is configured.
pub const DEFAULT_INDEX_VERSION: u32 = 7_100_099;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        None => default,
    }
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Split a comma separated list of date format specs. `||` alternatives
/// inside a spec are kept together.
pub fn split_date_formats(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    pub detection: DetectionConfig,
    pub index: IndexConfig,
    /// Policy of the root object.
    pub dynamic: Dynamic,
    /// Optional YAML or JSON file holding the dynamic templates.
    pub templates_file: Option<PathBuf>,
}

impl MappingConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `DYNAMAP_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("DYNAMAP_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let dynamic_raw = profiled_env_or(p, "DYNAMIC_MODE", "true");
        let dynamic = dynamic_raw.parse().unwrap_or_else(|e| {
            tracing::warn!(value = %dynamic_raw, error = %e, "invalid DYNAMIC_MODE, using 'true'");
            Dynamic::True
        });
        Self {
            profile: p.to_string(),
            detection: DetectionConfig::from_env_profiled(p),
            index: IndexConfig::from_env_profiled(p),
            dynamic,
            templates_file: profiled_env_opt(p, "DYNAMIC_TEMPLATES_FILE").map(PathBuf::from),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  detection:   numeric={}, date={}, formats=[{}]",
            self.detection.numeric_detection,
            self.detection.date_detection,
            self.detection.dynamic_date_formats.join(", ")
        );
        tracing::info!(
            "  index:       analyzer={}, ignore_malformed={}, version={}",
            self.index.default_analyzer,
            self.index.ignore_malformed,
            self.index.version_created
        );
        tracing::info!("  dynamic:     {}", self.dynamic);
        tracing::info!(
            "  templates:   {}",
            self.templates_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        );
    }

    /// Return a JSON view of the effective settings.
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "detection": {
                "numeric_detection": self.detection.numeric_detection,
                "date_detection": self.detection.date_detection,
                "dynamic_date_formats": self.detection.dynamic_date_formats,
            },
            "index": {
                "default_analyzer": self.index.default_analyzer,
                "ignore_malformed": self.index.ignore_malformed,
                "version_created": self.index.version_created,
            },
            "dynamic": self.dynamic.to_string(),
            "templates_file": self.templates_file,
        })
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            detection: DetectionConfig::default(),
            index: IndexConfig::default(),
            dynamic: Dynamic::True,
            templates_file: None,
        }
    }
}

// ── Detection ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub numeric_detection: bool,
    pub date_detection: bool,
    /// Date format specs in the order they are tried.
    pub dynamic_date_formats: Vec<String>,
}

impl DetectionConfig {
    fn from_env_profiled(p: &str) -> Self {
        let formats = profiled_env_opt(p, "DYNAMIC_DATE_FORMATS")
            .map(|raw| split_date_formats(&raw))
            .unwrap_or_else(default_date_formats);
        Self {
            numeric_detection: profiled_env_bool(p, "NUMERIC_DETECTION", false),
            date_detection: profiled_env_bool(p, "DATE_DETECTION", true),
            dynamic_date_formats: formats,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            numeric_detection: false,
            date_detection: true,
            dynamic_date_formats: default_date_formats(),
        }
    }
}

fn default_date_formats() -> Vec<String> {
    DEFAULT_DYNAMIC_DATE_FORMATS.iter().map(|s| s.to_string()).collect()
}

// ── Index ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Tolerate values that cannot be parsed for numeric and date fields.
    pub ignore_malformed: bool,
    /// Analyzer assigned to dynamically created text fields.
    pub default_analyzer: String,
    pub version_created: u32,
}

impl IndexConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            ignore_malformed: profiled_env_bool(p, "IGNORE_MALFORMED", false),
            default_analyzer: profiled_env_or(p, "DEFAULT_ANALYZER", "standard"),
            version_created: profiled_env_u32(p, "INDEX_VERSION", DEFAULT_INDEX_VERSION),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            ignore_malformed: false,
            default_analyzer: "standard".to_string(),
            version_created: DEFAULT_INDEX_VERSION,
        }
    }
}
