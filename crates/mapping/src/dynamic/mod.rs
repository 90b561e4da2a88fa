//! Dynamic field materialization: turns unknown leaves and objects met
//! while walking a document into mappers or runtime fields.
//!
//! Per leaf the flow is: classify the token, look for a dynamic template
//! accepting `(path, name, type)`, and either build the template's mapper
//! (always concrete) or hand the inferred type to the container's
//! [`Strategy`]. Objects are always concrete.

mod classify;
mod strategy;


pub use classify::{
    classify, classify_text, detect_date, try_parse_double, try_parse_long, Classification,
    InferredType,
};
pub use strategy::{new_binary_field, Strategy};

use dynamap_core::{Dynamic, RawValue};
use tracing::debug;

use crate::context::ParseContext;
use crate::date_format::DateFormat;
use crate::error::{MappingError, Result};
use crate::mapper::{Mapper, MapperSpec};
use crate::template::MatchType;

/// Entry point for fields that are not mapped yet, bound to one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicFieldsBuilder {
    strategy: Strategy,
}

impl DynamicFieldsBuilder {
    /// Containers mapped with `dynamic: true`.
    pub const DYNAMIC_TRUE: DynamicFieldsBuilder = DynamicFieldsBuilder {
        strategy: Strategy::Concrete,
    };

    /// Containers mapped with `dynamic: runtime`.
    pub const DYNAMIC_RUNTIME: DynamicFieldsBuilder = DynamicFieldsBuilder {
        strategy: Strategy::Runtime,
    };

    /// Builder for a container's policy; `None` when the policy creates nothing.
    pub fn for_dynamic(dynamic: Dynamic) -> Option<&'static DynamicFieldsBuilder> {
        match dynamic {
            Dynamic::True => Some(&Self::DYNAMIC_TRUE),
            Dynamic::Runtime => Some(&Self::DYNAMIC_RUNTIME),
            Dynamic::Strict | Dynamic::False => None,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Create the field for an unknown leaf `name` holding `value` under the
    /// current path.
    ///
    /// Concrete fields index `value` right away; runtime fields only record
    /// their type.
    pub fn materialize_leaf(&self, ctx: &mut ParseContext<'_>, value: &RawValue, name: &str) -> Result<()> {
        let inferred = match classify(value, ctx.detection())? {
            Classification::Inferred(inferred) => inferred,
            Classification::TemplateOnly => {
                return self.materialize_template_only_string_field(ctx, value, name)
            }
        };

        if let Some(spec) = find_template_spec(ctx, name, inferred.match_type(), inferred.date_format())? {
            return strategy::create_concrete(ctx, spec, value);
        }

        match inferred {
            InferredType::String => self.strategy.new_string_field(ctx, name, value),
            InferredType::Long => self.strategy.new_long_field(ctx, name, value),
            InferredType::Double => self.strategy.new_double_field(ctx, name, value),
            InferredType::Boolean => self.strategy.new_boolean_field(ctx, name, value),
            InferredType::Date(format) => self.strategy.new_date_field(ctx, name, format, value),
            InferredType::Binary => new_binary_field(ctx, name, value),
        }
    }

    /// Create a field for a token no type rule covers, but only when a
    /// string template matches. Without one nothing is created.
    pub fn materialize_template_only_string_field(
        &self,
        ctx: &mut ParseContext<'_>,
        value: &RawValue,
        name: &str,
    ) -> Result<()> {
        match find_template_spec(ctx, name, MatchType::String, None)? {
            Some(spec) => strategy::create_concrete(ctx, spec, value),
            None => {
                debug!(path = %ctx.path().path_as_text(name), "no template for unclassified value");
                Ok(())
            }
        }
    }

    /// Mapper for an unknown object `name`: the matching object template's,
    /// otherwise an enabled object inheriting its parent's policy.
    ///
    /// The caller registers the returned mapper.
    pub fn materialize_object(&self, ctx: &ParseContext<'_>, name: &str) -> Result<Mapper> {
        if let Some(mapper) = self.object_from_template(ctx, name)? {
            return Ok(mapper);
        }
        let mapper = MapperSpec::object(name, ctx.settings().version_created).build(ctx.path());
        debug!(path = mapper.full_path(), "dynamic object created");
        Ok(mapper)
    }

    /// Mapper built from the first object template accepting `name`, if any.
    pub fn object_from_template(&self, ctx: &ParseContext<'_>, name: &str) -> Result<Option<Mapper>> {
        Ok(find_template_spec(ctx, name, MatchType::Object, None)?.map(|spec| spec.build(ctx.path())))
    }
}

/// Resolve the first template accepting the field into an unbuilt spec.
///
/// `date_format` is the detected format, offered to the date type parser
/// when the template mapping does not set one.
fn find_template_spec<'a>(
    ctx: &ParseContext<'a>,
    name: &str,
    match_type: MatchType,
    date_format: Option<&'a DateFormat>,
) -> Result<Option<MapperSpec>> {
    let full_path = ctx.path().path_as_text(name);
    let Some(template) = ctx.templates().find(&full_path, name, match_type) else {
        return Ok(None);
    };

    let dynamic_type = match_type.default_mapping_type();
    let mapping_type = template.mapping_type(dynamic_type);
    let parser = ctx
        .type_parsers()
        .get(&mapping_type)
        .ok_or_else(|| MappingError::UnknownMappingType {
            field: name.to_string(),
            mapping_type: mapping_type.clone(),
        })?;

    debug!(
        path = %full_path,
        template = template.name(),
        mapping_type = %mapping_type,
        "dynamic template matched"
    );
    let config = template.mapping_for_name(name, dynamic_type);
    parser(name, &config, &ctx.parser_context(date_format)).map(Some)
}
