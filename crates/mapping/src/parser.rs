//! Walks a JSON document against an [`IndexMapping`], indexing known
//! fields and handing unknown ones to the dynamic fields builder.

use dynamap_core::{DocId, Dynamic, ParsedDocument, RawValue};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::context::ParseContext;
use crate::dynamic::DynamicFieldsBuilder;
use crate::error::{MappingError, Result};
use crate::mapper::Mapper;
use crate::mapping::IndexMapping;
use crate::runtime::RuntimeField;

/// Result of parsing one document: its indexed values plus the mapping
/// updates it proposes. Nothing is committed until
/// [`IndexMapping::merge`] accepts the updates.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub doc: ParsedDocument,
    pub mappers: Vec<Mapper>,
    pub runtime_fields: Vec<RuntimeField>,
}

impl ParseOutcome {
    pub fn has_mapping_updates(&self) -> bool {
        !self.mappers.is_empty() || !self.runtime_fields.is_empty()
    }
}

/// Single-document walker over a read-only mapping snapshot.
///
/// Parsers borrow the mapping immutably, so any number of them can run in
/// parallel against the same snapshot.
#[derive(Debug, Clone, Copy)]
pub struct DocumentParser<'a> {
    mapping: &'a IndexMapping,
}

/// What the mapping already says about a path.
enum Existing {
    Mapper(Mapper),
    Runtime,
    Unknown,
}

impl<'a> DocumentParser<'a> {
    pub fn new(mapping: &'a IndexMapping) -> Self {
        Self { mapping }
    }

    pub fn parse(&self, source: &Value) -> Result<ParseOutcome> {
        self.parse_document(source, ParsedDocument::new())
    }

    pub fn parse_with_id(&self, source: &Value, id: DocId) -> Result<ParseOutcome> {
        self.parse_document(source, ParsedDocument::with_id(id))
    }

    fn parse_document(&self, source: &Value, doc: ParsedDocument) -> Result<ParseOutcome> {
        let object = source
            .as_object()
            .ok_or_else(|| MappingError::malformed("_source", "a document must be a JSON object"))?;

        let mut ctx = ParseContext::with_document(self.mapping.rules(), doc);
        self.parse_object(&mut ctx, object, self.mapping.dynamic())?;

        let (doc, mappers, runtime_fields) = ctx.finish();
        debug!(
            doc_id = %doc.id,
            fields = doc.fields.len(),
            new_mappers = mappers.len(),
            new_runtime_fields = runtime_fields.len(),
            "document parsed"
        );
        Ok(ParseOutcome {
            doc,
            mappers,
            runtime_fields,
        })
    }

    fn parse_object(&self, ctx: &mut ParseContext<'_>, object: &Map<String, Value>, dynamic: Dynamic) -> Result<()> {
        for (name, value) in object {
            self.parse_value(ctx, name, value, dynamic)?;
        }
        Ok(())
    }

    fn parse_value(&self, ctx: &mut ParseContext<'_>, name: &str, value: &Value, dynamic: Dynamic) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            Value::Object(child) => self.parse_inner_object(ctx, name, child, dynamic),
            Value::Array(items) => {
                for item in items {
                    self.parse_value(ctx, name, item, dynamic)?;
                }
                Ok(())
            }
            scalar => match RawValue::from_json(scalar) {
                Some(raw) => self.parse_leaf(ctx, name, &raw, dynamic),
                None => Ok(()),
            },
        }
    }

    fn parse_leaf(&self, ctx: &mut ParseContext<'_>, name: &str, value: &RawValue, dynamic: Dynamic) -> Result<()> {
        let full_path = ctx.path().path_as_text(name);
        match self.existing(ctx, &full_path) {
            Existing::Mapper(Mapper::Field(field)) => field.index_value(value, ctx.doc_mut()),
            Existing::Mapper(Mapper::Object(_)) => Err(MappingError::malformed(
                &full_path,
                "object mapping received a concrete value",
            )),
            // Evaluated at query time from the source.
            Existing::Runtime => Ok(()),
            Existing::Unknown => match DynamicFieldsBuilder::for_dynamic(dynamic) {
                Some(builder) => builder.materialize_leaf(ctx, value, name),
                None => self.reject_or_skip(dynamic, full_path),
            },
        }
    }

    fn parse_inner_object(
        &self,
        ctx: &mut ParseContext<'_>,
        name: &str,
        child: &Map<String, Value>,
        dynamic: Dynamic,
    ) -> Result<()> {
        let full_path = ctx.path().path_as_text(name);
        let object = match self.existing(ctx, &full_path) {
            Existing::Mapper(Mapper::Object(object)) => object,
            Existing::Mapper(Mapper::Field(_)) | Existing::Runtime => {
                return Err(MappingError::malformed(
                    &full_path,
                    "leaf field received an object",
                ))
            }
            Existing::Unknown => {
                let Some(builder) = DynamicFieldsBuilder::for_dynamic(dynamic) else {
                    return self.reject_or_skip(dynamic, full_path);
                };
                match builder.materialize_object(ctx, name)? {
                    Mapper::Object(object) => {
                        ctx.add_dynamic_mapper(Mapper::Object(object.clone()));
                        object
                    }
                    Mapper::Field(field) => {
                        return Err(MappingError::malformed(
                            &full_path,
                            format!(
                                "object template produced a [{}] field",
                                field.kind.type_name()
                            ),
                        ))
                    }
                }
            }
        };

        if !object.enabled {
            trace!(path = %full_path, "skipping disabled object");
            return Ok(());
        }

        let child_dynamic = object.dynamic.unwrap_or(dynamic);
        ctx.path_mut().add(name);
        let result = self.parse_object(ctx, child, child_dynamic);
        ctx.path_mut().remove();
        result
    }

    fn reject_or_skip(&self, dynamic: Dynamic, path: String) -> Result<()> {
        if dynamic == Dynamic::Strict {
            return Err(MappingError::StrictDynamic { path });
        }
        trace!(path = %path, "dynamic disabled, field not mapped");
        Ok(())
    }

    /// Committed mappings first, then updates made earlier in this document.
    fn existing(&self, ctx: &ParseContext<'_>, full_path: &str) -> Existing {
        if let Some(mapper) = self.mapping.mapper(full_path) {
            return Existing::Mapper(mapper.clone());
        }
        if self.mapping.runtime_field(full_path).is_some() {
            return Existing::Runtime;
        }
        if let Some(mapper) = ctx
            .dynamic_mappers()
            .iter()
            .find(|m| m.full_path() == full_path)
        {
            return Existing::Mapper(mapper.clone());
        }
        if ctx
            .dynamic_runtime_fields()
            .iter()
            .any(|f| f.name == full_path)
        {
            return Existing::Runtime;
        }
        Existing::Unknown
    }
}
