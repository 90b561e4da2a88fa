//! Tests for mapper construction, type parsers and value indexing.

use dynamap_core::{IndexedValue, NumberType, ParsedDocument, RawValue};
use serde_json::json;

use super::*;
use crate::context::IndexSettings;

fn parse(type_name: &str, config: serde_json::Value, date_format: Option<&DateFormat>) -> Result<MapperSpec> {
    let settings = IndexSettings::default();
    let parsers = TypeParsers::builtin();
    let ctx = ParserContext {
        settings: &settings,
        date_format,
        parsers: &parsers,
    };
    let config = config.as_object().cloned().unwrap_or_default();
    let parser = parsers.get(type_name).expect("registered type");
    parser("field", &config, &ctx)
}

fn field(kind: FieldKind) -> FieldMapper {
    match MapperSpec::field("field", kind).build(&ContentPath::new()) {
        Mapper::Field(f) => f,
        other => panic!("expected a field, got {:?}", other),
    }
}

fn number(number_type: NumberKind, ignore_malformed: bool, coerce: bool) -> FieldMapper {
    field(FieldKind::Number {
        number_type,
        ignore_malformed,
        coerce,
    })
}

// ── Building ────────────────────────────────────────────────────────

#[test]
fn build_places_spec_under_path() {
    let path: ContentPath = ["user", "profile"].into_iter().collect();
    let spec = MapperSpec::field(
        "bio",
        FieldKind::Text {
            analyzer: "standard".to_string(),
        },
    )
    .with_multi_field(KEYWORD_SUBFIELD, FieldKind::Keyword { ignore_above: Some(256) });

    let mapper = spec.build(&path);
    assert_eq!(mapper.name(), "bio");
    assert_eq!(mapper.full_path(), "user.profile.bio");
    let sub = &mapper.as_field().unwrap().multi_fields[0];
    assert_eq!(sub.full_path, "user.profile.bio.keyword");

    // Building is pure: the same spec under the same path yields equal mappers.
    assert_eq!(spec.build(&path), mapper);
}

#[test]
fn object_json_lists_only_non_defaults() {
    let mapper = MapperSpec::object("meta", 7).build(&ContentPath::new());
    assert_eq!(mapper.type_name(), "object");
    assert_eq!(mapper.to_json(), json!({ "properties": {} }));

    let spec = MapperSpec::Object {
        name: "raw".to_string(),
        enabled: false,
        dynamic: Some(Dynamic::Runtime),
        index_version: 7,
    };
    assert_eq!(
        spec.build(&ContentPath::new()).to_json(),
        json!({ "enabled": false, "dynamic": "runtime", "properties": {} })
    );
}

#[test]
fn number_kinds_round_trip_names() {
    for kind in NumberKind::ALL {
        assert_eq!(kind.as_str().parse::<NumberKind>(), Ok(kind));
    }
    assert!("decimal".parse::<NumberKind>().is_err());
}

// ── Type parsers ────────────────────────────────────────────────────

#[test]
fn text_parser_defaults_analyzer_and_reads_multi_fields() {
    let spec = parse(
        "text",
        json!({ "type": "text", "fields": { "raw": { "type": "keyword", "ignore_above": 10 } } }),
        None,
    )
    .unwrap();
    let mapper = spec.build(&ContentPath::new());
    assert_eq!(
        mapper.to_json(),
        json!({
            "type": "text",
            "analyzer": "standard",
            "fields": { "raw": { "type": "keyword", "ignore_above": 10 } }
        })
    );
}

#[test]
fn parsers_reject_unknown_and_ill_typed_params() {
    assert!(matches!(
        parse("boolean", json!({ "type": "boolean", "null_value": true }), None),
        Err(MappingError::InvalidMapping { .. })
    ));
    assert!(matches!(
        parse("keyword", json!({ "ignore_above": -1 }), None),
        Err(MappingError::InvalidMapping { .. })
    ));
    assert!(matches!(
        parse("long", json!({ "coerce": "maybe" }), None),
        Err(MappingError::InvalidMapping { .. })
    ));
    assert!(matches!(
        parse("text", json!({ "fields": { "x": { "type": "vector" } } }), None),
        Err(MappingError::UnknownMappingType { .. })
    ));
    assert!(matches!(
        parse("text", json!({ "fields": { "x": { "type": "object" } } }), None),
        Err(MappingError::InvalidMapping { .. })
    ));
}

#[test]
fn common_params_are_accepted() {
    let spec = parse("keyword", json!({ "type": "keyword", "index": true, "doc_values": false }), None).unwrap();
    assert_eq!(
        spec,
        MapperSpec::field("field", FieldKind::Keyword { ignore_above: None })
    );
}

#[test]
fn number_parser_defaults_from_settings() {
    let spec = parse("short", json!({}), None).unwrap();
    assert_eq!(
        spec,
        MapperSpec::field(
            "field",
            FieldKind::Number {
                number_type: NumberKind::Short,
                ignore_malformed: false,
                coerce: true,
            }
        )
    );
    let spec = parse("half_float", json!({ "ignore_malformed": "true", "coerce": false }), None).unwrap();
    assert_eq!(
        spec,
        MapperSpec::field(
            "field",
            FieldKind::Number {
                number_type: NumberKind::HalfFloat,
                ignore_malformed: true,
                coerce: false,
            }
        )
    );
}

#[test]
fn date_format_precedence() {
    let detected = DateFormat::parse_spec("yyyy/MM/dd").unwrap();

    let explicit = parse("date", json!({ "format": "epoch_second" }), Some(&detected)).unwrap();
    let from_detection = parse("date", json!({}), Some(&detected)).unwrap();
    let fallback = parse("date", json!({}), None).unwrap();

    let spec_of = |spec: MapperSpec| match spec.into_leaf_kind().unwrap().1 {
        FieldKind::Date { format, .. } => format.spec().to_string(),
        other => panic!("expected a date, got {:?}", other),
    };
    assert_eq!(spec_of(explicit), "epoch_second");
    assert_eq!(spec_of(from_detection), "yyyy/MM/dd");
    assert_eq!(spec_of(fallback), "strict_date_optional_time||epoch_millis");

    assert!(matches!(
        parse("date", json!({ "format": "yyyy-QQ" }), None),
        Err(MappingError::InvalidMapping { .. })
    ));
}

#[test]
fn object_parser_reads_dynamic_and_enabled() {
    let spec = parse("object", json!({ "dynamic": false, "enabled": true }), None).unwrap();
    assert!(matches!(
        spec,
        MapperSpec::Object {
            dynamic: Some(Dynamic::False),
            enabled: true,
            ..
        }
    ));
    let spec = parse("object", json!({ "dynamic": "Runtime" }), None).unwrap();
    assert!(matches!(
        spec,
        MapperSpec::Object {
            dynamic: Some(Dynamic::Runtime),
            ..
        }
    ));
    assert!(parse("object", json!({ "dynamic": "sometimes" }), None).is_err());
    assert!(parse("object", json!({ "dynamic": 1 }), None).is_err());
}

#[test]
fn custom_parsers_can_be_registered() {
    let mut parsers = TypeParsers::new();
    assert!(!parsers.contains("keyword"));
    parsers.register("tag", |name, _config, _ctx| {
        Ok(MapperSpec::field(name, FieldKind::Keyword { ignore_above: Some(32) }))
    });
    assert!(parsers.contains("tag"));
    assert!(format!("{:?}", parsers).contains("tag"));
}

// ── Indexing ────────────────────────────────────────────────────────

#[test]
fn keyword_over_cap_is_ignored_not_failed() {
    let mapper = field(FieldKind::Keyword { ignore_above: Some(3) });
    let mut doc = ParsedDocument::new();
    mapper.index_value(&RawValue::string("abc"), &mut doc).unwrap();
    mapper.index_value(&RawValue::string("abcd"), &mut doc).unwrap();
    assert_eq!(doc.values("field"), vec![&IndexedValue::Keyword("abc".to_string())]);
    assert_eq!(doc.ignored, vec!["field".to_string()]);
}

#[test]
fn malformed_numbers_fail_or_are_ignored() {
    let strict = number(NumberKind::Long, false, true);
    let lenient = number(NumberKind::Long, true, true);
    let mut doc = ParsedDocument::new();

    assert!(matches!(
        strict.index_value(&RawValue::string("ten"), &mut doc),
        Err(MappingError::Malformed { .. })
    ));
    lenient.index_value(&RawValue::string("ten"), &mut doc).unwrap();
    assert!(doc.fields.is_empty());
    assert_eq!(doc.ignored, vec!["field".to_string()]);
}

#[test]
fn coercion_controls_strings_and_fractions() {
    let mut doc = ParsedDocument::new();
    let coercing = number(NumberKind::Integer, false, true);
    coercing.index_value(&RawValue::string(" 12 "), &mut doc).unwrap();
    coercing
        .index_value(&RawValue::number("3.0", NumberType::Double), &mut doc)
        .unwrap();
    assert_eq!(
        doc.values("field"),
        vec![&IndexedValue::Long(12), &IndexedValue::Long(3)]
    );
    assert!(coercing
        .index_value(&RawValue::number("3.5", NumberType::Double), &mut doc)
        .is_err());

    let exact = number(NumberKind::Integer, false, false);
    assert!(exact.index_value(&RawValue::string("12"), &mut doc).is_err());
}

#[test]
fn integral_kinds_check_range() {
    let mut doc = ParsedDocument::new();
    let byte = number(NumberKind::Byte, false, true);
    byte.index_value(&RawValue::number("127", NumberType::Int), &mut doc).unwrap();
    assert!(byte
        .index_value(&RawValue::number("128", NumberType::Int), &mut doc)
        .is_err());

    let long = number(NumberKind::Long, false, true);
    let mut doc = ParsedDocument::new();
    long.index_value(&RawValue::number("9223372036854775807", NumberType::Long), &mut doc)
        .unwrap();
    long.index_value(&RawValue::number("-9223372036854775808", NumberType::Long), &mut doc)
        .unwrap();
    assert_eq!(
        doc.values("field"),
        vec![&IndexedValue::Long(i64::MAX), &IndexedValue::Long(i64::MIN)]
    );
    for past_the_end in ["9223372036854775808", "-9223372036854775809", "9.223372036854775808e18"] {
        assert!(
            long.index_value(&RawValue::number(past_the_end, NumberType::BigInteger), &mut doc)
                .is_err(),
            "{}",
            past_the_end
        );
    }
    assert_eq!(doc.values("field").len(), 2);
}

#[test]
fn floats_narrow_and_must_stay_finite() {
    let mut doc = ParsedDocument::new();
    let float = number(NumberKind::Float, false, true);
    float
        .index_value(&RawValue::number("0.5", NumberType::Double), &mut doc)
        .unwrap();
    assert_eq!(doc.values("field"), vec![&IndexedValue::Float(0.5)]);
    assert!(float
        .index_value(&RawValue::number("1e300", NumberType::Double), &mut doc)
        .is_err());

    let double = number(NumberKind::Double, false, true);
    let mut doc = ParsedDocument::new();
    double
        .index_value(&RawValue::number("1e300", NumberType::Double), &mut doc)
        .unwrap();
    assert_eq!(doc.values("field"), vec![&IndexedValue::Double(1e300)]);
}

#[test]
fn booleans_accept_only_canonical_strings() {
    let mapper = field(FieldKind::Boolean);
    let mut doc = ParsedDocument::new();
    mapper.index_value(&RawValue::string("true"), &mut doc).unwrap();
    mapper.index_value(&RawValue::string(""), &mut doc).unwrap();
    mapper.index_value(&RawValue::Boolean(true), &mut doc).unwrap();
    assert_eq!(
        doc.values("field"),
        vec![
            &IndexedValue::Boolean(true),
            &IndexedValue::Boolean(false),
            &IndexedValue::Boolean(true)
        ]
    );
    assert!(mapper.index_value(&RawValue::string("yes"), &mut doc).is_err());
}

#[test]
fn nulls_index_nothing_and_multi_fields_follow_parent() {
    let mapper = match MapperSpec::field(
        "title",
        FieldKind::Text {
            analyzer: "standard".to_string(),
        },
    )
    .with_multi_field("raw", FieldKind::Keyword { ignore_above: None })
    .build(&ContentPath::new())
    {
        Mapper::Field(f) => f,
        other => panic!("expected a field, got {:?}", other),
    };

    let mut doc = ParsedDocument::new();
    mapper.index_value(&RawValue::Null, &mut doc).unwrap();
    assert!(doc.fields.is_empty());

    mapper.index_value(&RawValue::string("Rust"), &mut doc).unwrap();
    assert_eq!(doc.values("title"), vec![&IndexedValue::Text("Rust".to_string())]);
    assert_eq!(doc.values("title.raw"), vec![&IndexedValue::Keyword("Rust".to_string())]);
}

#[test]
fn binary_fields_take_only_binary_tokens() {
    let mapper = field(FieldKind::Binary);
    let mut doc = ParsedDocument::new();
    mapper.index_value(&RawValue::Binary(vec![7]), &mut doc).unwrap();
    assert_eq!(doc.values("field"), vec![&IndexedValue::Binary(vec![7])]);
    assert!(mapper.index_value(&RawValue::string("Bw=="), &mut doc).is_err());
}

#[test]
fn dates_index_epoch_millis() {
    let mapper = field(FieldKind::Date {
        format: DateFormat::mapping_default(),
        ignore_malformed: true,
        index_version: 7,
    });
    let mut doc = ParsedDocument::new();
    mapper.index_value(&RawValue::string("2021-05-01"), &mut doc).unwrap();
    mapper
        .index_value(&RawValue::number("1620000000000", NumberType::Long), &mut doc)
        .unwrap();
    mapper.index_value(&RawValue::string("yesterday"), &mut doc).unwrap();
    assert_eq!(
        doc.values("field"),
        vec![
            &IndexedValue::Date(1_619_827_200_000),
            &IndexedValue::Date(1_620_000_000_000)
        ]
    );
    assert_eq!(doc.ignored, vec!["field".to_string()]);
}
