//! Where a newly detected leaf lands: an indexed mapper or a runtime field.

use dynamap_core::RawValue;
use tracing::debug;

use crate::context::ParseContext;
use crate::date_format::DateFormat;
use crate::error::Result;
use crate::mapper::{FieldKind, MapperSpec, NumberKind, KEYWORD_IGNORE_ABOVE, KEYWORD_SUBFIELD};
use crate::runtime::{RuntimeField, RuntimeFieldFactory};

/// Materialization destination for leaves of one container.
///
/// `Concrete` builds a mapper, registers it and indexes the value with it.
/// `Runtime` registers a query-time field under the full dotted name and
/// indexes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Concrete,
    Runtime,
}

impl Strategy {
    /// Full text with a `keyword` sub-field capped at
    /// [`KEYWORD_IGNORE_ABOVE`] characters.
    pub fn new_string_field(self, ctx: &mut ParseContext<'_>, name: &str, value: &RawValue) -> Result<()> {
        match self {
            Strategy::Concrete => {
                let analyzer = ctx.settings().default_analyzer.clone();
                let spec = MapperSpec::field(name, FieldKind::Text { analyzer }).with_multi_field(
                    KEYWORD_SUBFIELD,
                    FieldKind::Keyword {
                        ignore_above: Some(KEYWORD_IGNORE_ABOVE),
                    },
                );
                create_concrete(ctx, spec, value)
            }
            Strategy::Runtime => create_runtime(ctx, name, |f, full| f.new_string_field(full)),
        }
    }

    pub fn new_long_field(self, ctx: &mut ParseContext<'_>, name: &str, value: &RawValue) -> Result<()> {
        match self {
            Strategy::Concrete => {
                let spec = MapperSpec::field(name, number_kind(ctx, NumberKind::Long));
                create_concrete(ctx, spec, value)
            }
            Strategy::Runtime => create_runtime(ctx, name, |f, full| f.new_long_field(full)),
        }
    }

    /// Concrete doubles are mapped as `float`.
    pub fn new_double_field(self, ctx: &mut ParseContext<'_>, name: &str, value: &RawValue) -> Result<()> {
        match self {
            Strategy::Concrete => {
                let spec = MapperSpec::field(name, number_kind(ctx, NumberKind::Float));
                create_concrete(ctx, spec, value)
            }
            Strategy::Runtime => create_runtime(ctx, name, |f, full| f.new_double_field(full)),
        }
    }

    pub fn new_boolean_field(self, ctx: &mut ParseContext<'_>, name: &str, value: &RawValue) -> Result<()> {
        match self {
            Strategy::Concrete => create_concrete(ctx, MapperSpec::field(name, FieldKind::Boolean), value),
            Strategy::Runtime => create_runtime(ctx, name, |f, full| f.new_boolean_field(full)),
        }
    }

    /// Date field bound to the format that matched during detection.
    pub fn new_date_field(
        self,
        ctx: &mut ParseContext<'_>,
        name: &str,
        format: &DateFormat,
        value: &RawValue,
    ) -> Result<()> {
        match self {
            Strategy::Concrete => {
                let settings = ctx.settings();
                let spec = MapperSpec::field(
                    name,
                    FieldKind::Date {
                        format: format.clone(),
                        ignore_malformed: settings.ignore_malformed,
                        index_version: settings.version_created,
                    },
                );
                create_concrete(ctx, spec, value)
            }
            Strategy::Runtime => create_runtime(ctx, name, |f, full| f.new_date_field(full, format)),
        }
    }
}

/// Binary leaves are always concrete; runtime fields have no binary type.
pub fn new_binary_field(ctx: &mut ParseContext<'_>, name: &str, value: &RawValue) -> Result<()> {
    create_concrete(ctx, MapperSpec::field(name, FieldKind::Binary), value)
}

fn number_kind(ctx: &ParseContext<'_>, number_type: NumberKind) -> FieldKind {
    FieldKind::Number {
        number_type,
        ignore_malformed: ctx.settings().ignore_malformed,
        coerce: true,
    }
}

/// Build `spec` at the current path, register it, then index `value` with it.
pub(crate) fn create_concrete(ctx: &mut ParseContext<'_>, spec: MapperSpec, value: &RawValue) -> Result<()> {
    let mapper = spec.build(ctx.path());
    debug!(
        path = mapper.full_path(),
        mapping_type = mapper.type_name(),
        "dynamic field created"
    );
    ctx.add_dynamic_mapper_and_index(mapper, value)
}

fn create_runtime<F>(ctx: &mut ParseContext<'_>, name: &str, make: F) -> Result<()>
where
    F: FnOnce(&dyn RuntimeFieldFactory, &str) -> RuntimeField,
{
    let full_name = ctx.path().path_as_text(name);
    let field = make(ctx.runtime_field_factory(), &full_name);
    debug!(
        path = %field.name,
        runtime_type = field.type_name(),
        "dynamic runtime field created"
    );
    ctx.add_dynamic_runtime_field(field);
    Ok(())
}
