//! Dynamic mapping: infers field types for previously unseen document
//! fields and materializes them as indexed mappers or runtime fields.
//!
//! [`DynamicFieldsBuilder`] is the engine. [`IndexMapping`] and
//! [`DocumentParser`] drive it over JSON documents and commit what it
//! creates.

pub mod context;
pub mod date_format;
pub mod dynamic;
pub mod error;
pub mod mapper;
pub mod mapping;
pub mod parser;
pub mod path;
pub mod runtime;
pub mod template;

pub use context::{DetectionPolicy, IndexSettings, MappingRules, ParseContext};
pub use date_format::DateFormat;
pub use dynamic::{Classification, DynamicFieldsBuilder, InferredType, Strategy};
pub use error::{MappingError, Result};
pub use mapper::{FieldKind, FieldMapper, Mapper, MapperSpec, NumberKind, ObjectMapper, TypeParsers};
pub use mapping::IndexMapping;
pub use parser::{DocumentParser, ParseOutcome};
pub use path::ContentPath;
pub use runtime::{DefaultRuntimeFields, RuntimeField, RuntimeFieldFactory, RuntimeFieldKind};
pub use template::{DynamicTemplate, MatchType, TemplateDef, TemplateRegistry};
