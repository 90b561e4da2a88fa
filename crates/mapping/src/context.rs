//! Read-only mapping rules and the per-document parse context.

use std::fmt;
use std::sync::Arc;

use dynamap_core::config::{DetectionConfig, IndexConfig, MappingConfig};
use dynamap_core::{ParsedDocument, RawValue};

use crate::date_format::DateFormat;
use crate::error::{MappingError, Result};
use crate::mapper::{Mapper, ParserContext, TypeParsers};
use crate::path::ContentPath;
use crate::runtime::{DefaultRuntimeFields, RuntimeField, RuntimeFieldFactory};
use crate::template::TemplateRegistry;

// ── Settings ────────────────────────────────────────────────────────

/// Index-level settings consulted when building dynamic mappers.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSettings {
    pub ignore_malformed: bool,
    pub default_analyzer: String,
    pub version_created: u32,
}

impl IndexSettings {
    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            ignore_malformed: config.ignore_malformed,
            default_analyzer: config.default_analyzer.clone(),
            version_created: config.version_created,
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self::from_config(&IndexConfig::default())
    }
}

/// How strings of unknown fields are probed for numbers and dates.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionPolicy {
    pub numeric_detection: bool,
    pub date_detection: bool,
    /// Tried in order; the first that parses the value wins.
    pub date_formats: Vec<DateFormat>,
}

impl DetectionPolicy {
    pub fn new(numeric_detection: bool, date_detection: bool, date_formats: Vec<DateFormat>) -> Self {
        Self {
            numeric_detection,
            date_detection,
            date_formats,
        }
    }

    /// Compile the configured date format specs.
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        let date_formats = config
            .dynamic_date_formats
            .iter()
            .map(|spec| DateFormat::parse_spec(spec))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(
            config.numeric_detection,
            config.date_detection,
            date_formats,
        ))
    }
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default()).expect("default date formats compile")
    }
}

// ── Mapping rules ───────────────────────────────────────────────────

/// Immutable snapshot of everything dynamic mapping reads: settings,
/// detection policy, templates, type parsers and the runtime field factory.
///
/// Shared freely across threads parsing different documents.
pub struct MappingRules {
    pub settings: IndexSettings,
    pub detection: DetectionPolicy,
    pub templates: TemplateRegistry,
    pub type_parsers: TypeParsers,
    pub runtime_fields: Arc<dyn RuntimeFieldFactory>,
}

impl MappingRules {
    pub fn new(settings: IndexSettings, detection: DetectionPolicy) -> Self {
        Self {
            settings,
            detection,
            templates: TemplateRegistry::empty(),
            type_parsers: TypeParsers::builtin(),
            runtime_fields: Arc::new(DefaultRuntimeFields),
        }
    }

    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_type_parsers(mut self, type_parsers: TypeParsers) -> Self {
        self.type_parsers = type_parsers;
        self
    }

    pub fn with_runtime_fields(mut self, factory: Arc<dyn RuntimeFieldFactory>) -> Self {
        self.runtime_fields = factory;
        self
    }

    /// Build rules from config, loading the templates file when one is set.
    pub fn from_config(config: &MappingConfig) -> Result<Self> {
        let templates = match &config.templates_file {
            Some(path) => TemplateRegistry::load(path)?,
            None => TemplateRegistry::empty(),
        };
        Ok(Self::new(
            IndexSettings::from_config(&config.index),
            DetectionPolicy::from_config(&config.detection)?,
        )
        .with_templates(templates))
    }
}

impl Default for MappingRules {
    fn default() -> Self {
        Self::new(IndexSettings::default(), DetectionPolicy::default())
    }
}

impl fmt::Debug for MappingRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRules")
            .field("settings", &self.settings)
            .field("detection", &self.detection)
            .field("templates", &self.templates)
            .field("type_parsers", &self.type_parsers)
            .finish_non_exhaustive()
    }
}

// ── Parse context ───────────────────────────────────────────────────

/// State of one document parse.
///
/// Reads configuration from the shared [`MappingRules`] and accumulates the
/// document's indexed values plus the mappers and runtime fields it created.
/// Private to one document, so never synchronized.
pub struct ParseContext<'a> {
    rules: &'a MappingRules,
    path: ContentPath,
    doc: ParsedDocument,
    dynamic_mappers: Vec<Mapper>,
    dynamic_runtime_fields: Vec<RuntimeField>,
}

impl<'a> ParseContext<'a> {
    pub fn new(rules: &'a MappingRules) -> Self {
        Self::with_document(rules, ParsedDocument::new())
    }

    pub fn with_document(rules: &'a MappingRules, doc: ParsedDocument) -> Self {
        Self {
            rules,
            path: ContentPath::new(),
            doc,
            dynamic_mappers: Vec::new(),
            dynamic_runtime_fields: Vec::new(),
        }
    }

    pub fn rules(&self) -> &'a MappingRules {
        self.rules
    }

    pub fn settings(&self) -> &'a IndexSettings {
        &self.rules.settings
    }

    pub fn detection(&self) -> &'a DetectionPolicy {
        &self.rules.detection
    }

    pub fn templates(&self) -> &'a TemplateRegistry {
        &self.rules.templates
    }

    pub fn type_parsers(&self) -> &'a TypeParsers {
        &self.rules.type_parsers
    }

    pub fn runtime_field_factory(&self) -> &'a dyn RuntimeFieldFactory {
        self.rules.runtime_fields.as_ref()
    }

    /// Inputs for type parsers, carrying the detected date format if any.
    pub fn parser_context(&self, date_format: Option<&'a DateFormat>) -> ParserContext<'a> {
        ParserContext {
            settings: &self.rules.settings,
            date_format,
            parsers: &self.rules.type_parsers,
        }
    }

    pub fn path(&self) -> &ContentPath {
        &self.path
    }

    pub fn path_mut(&mut self) -> &mut ContentPath {
        &mut self.path
    }

    pub fn doc(&self) -> &ParsedDocument {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut ParsedDocument {
        &mut self.doc
    }

    pub fn dynamic_mappers(&self) -> &[Mapper] {
        &self.dynamic_mappers
    }

    pub fn dynamic_runtime_fields(&self) -> &[RuntimeField] {
        &self.dynamic_runtime_fields
    }

    pub fn add_dynamic_mapper(&mut self, mapper: Mapper) {
        self.dynamic_mappers.push(mapper);
    }

    pub fn add_dynamic_runtime_field(&mut self, field: RuntimeField) {
        self.dynamic_runtime_fields.push(field);
    }

    /// Register a freshly built concrete mapper, then index `value` with it.
    pub(crate) fn add_dynamic_mapper_and_index(&mut self, mapper: Mapper, value: &RawValue) -> Result<()> {
        if let Mapper::Object(object) = &mapper {
            return Err(MappingError::invalid_mapping(
                &object.full_path,
                "an object mapping cannot hold a leaf value",
            ));
        }
        self.dynamic_mappers.push(mapper);
        match self.dynamic_mappers.last() {
            Some(Mapper::Field(field)) => field.index_value(value, &mut self.doc),
            _ => Ok(()),
        }
    }

    /// Consume the context, handing back the document and the mapping updates.
    pub fn finish(self) -> (ParsedDocument, Vec<Mapper>, Vec<RuntimeField>) {
        (self.doc, self.dynamic_mappers, self.dynamic_runtime_fields)
    }
}
