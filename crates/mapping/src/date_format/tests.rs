//! Tests for date format specs.

use super::*;

const MAY_FIRST_2021_MILLIS: i64 = 1_619_827_200_000;

fn format(spec: &str) -> DateFormat {
    DateFormat::parse_spec(spec).unwrap()
}

#[test]
fn letter_pattern_parses_plain_date() {
    let f = format("yyyy-MM-dd");
    assert_eq!(f.parse_millis("2021-05-01"), Some(MAY_FIRST_2021_MILLIS));
    assert!(!f.parses("2021-05-01T10:00:00"));
    assert!(!f.parses("2021-13-01"));
    assert!(!f.parses("hello"));
}

#[test]
fn optional_time_accepts_date_and_full_timestamps() {
    let f = format("strict_date_optional_time");
    assert_eq!(f.parse_millis("2021-05-01"), Some(MAY_FIRST_2021_MILLIS));
    assert_eq!(
        f.parse_millis("2021-05-01T10:15:30Z"),
        Some(MAY_FIRST_2021_MILLIS + 36_930_000)
    );
    assert_eq!(
        f.parse_millis("2021-05-01T10:15:30.123+02:00"),
        Some(MAY_FIRST_2021_MILLIS + 29_730_123)
    );
    assert_eq!(
        f.parse_millis("2021-05-01T10:15"),
        Some(MAY_FIRST_2021_MILLIS + 36_900_000)
    );
    assert!(!f.parses("05/01/2021"));
}

#[test]
fn padded_fields_require_full_width() {
    let iso = format("strict_date_optional_time");
    for text in ["1-2", "3-4-5", "12-1", "2021-5-1", "21-05-01", "2021-05-01T1:00", " 2021-05-01"] {
        assert!(!iso.parses(text), "{}", text);
    }
    let slashed = format("yyyy/MM/dd HH:mm:ss||yyyy/MM/dd");
    for text in ["1/2/3", "2021/5/1", "2021/05/01 1:2:3"] {
        assert!(!slashed.parses(text), "{}", text);
    }
    assert!(!format("basic_date").parses("2021051"));
}

#[test]
fn single_letters_accept_unpadded_numbers() {
    let f = format("d/M/yyyy");
    assert_eq!(f.parse_millis("1/5/2021"), Some(MAY_FIRST_2021_MILLIS));
    assert_eq!(f.parse_millis("01/05/2021"), Some(MAY_FIRST_2021_MILLIS));
    assert!(!f.parses("1/5/21"));
}

#[test]
fn alternatives_are_tried_in_order() {
    let f = format("yyyy/MM/dd HH:mm:ss||yyyy/MM/dd");
    assert_eq!(f.parse_millis("2021/05/01"), Some(MAY_FIRST_2021_MILLIS));
    assert_eq!(
        f.parse_millis("2021/05/01 00:00:01"),
        Some(MAY_FIRST_2021_MILLIS + 1_000)
    );
    assert!(!f.parses("2021-05-01"));
}

#[test]
fn quoted_literals_and_separators() {
    let f = format("yyyy-MM-dd'T'HH:mm:ss");
    assert_eq!(
        f.parse_millis("2021-05-01T00:00:10"),
        Some(MAY_FIRST_2021_MILLIS + 10_000)
    );
    let dotted = format("dd.MM.yyyy");
    assert_eq!(dotted.parse_millis("01.05.2021"), Some(MAY_FIRST_2021_MILLIS));
}

#[test]
fn epoch_formats() {
    let millis = format("epoch_millis");
    assert_eq!(millis.parse_millis("1620000000000"), Some(1_620_000_000_000));
    assert_eq!(millis.parse_millis("-1000"), Some(-1_000));
    assert!(!millis.parses("inf"));
    assert!(!millis.parses("12a"));

    let seconds = format("epoch_second");
    assert_eq!(seconds.parse_millis("1620000000"), Some(1_620_000_000_000));
    assert_eq!(seconds.parse_millis("1.5"), Some(1_500));
}

#[test]
fn basic_date_has_no_separators() {
    assert_eq!(
        format("basic_date").parse_millis("20210501"),
        Some(MAY_FIRST_2021_MILLIS)
    );
}

#[test]
fn rejects_unknown_letters_and_empty_alternatives() {
    assert!(matches!(
        DateFormat::parse_spec("yyyy-QQ"),
        Err(MappingError::InvalidDateFormat { .. })
    ));
    assert!(DateFormat::parse_spec("yyyy||").is_err());
    assert!(DateFormat::parse_spec("").is_err());
    assert!(DateFormat::parse_spec("yyyy-'MM").is_err());
}

#[test]
fn equality_and_serde_use_the_spec() {
    let a = format("yyyy-MM-dd");
    let b: DateFormat = "yyyy-MM-dd".parse().unwrap();
    assert_eq!(a, b);
    assert_ne!(a, format("yyyy/MM/dd"));

    let json = serde_json::to_string(&a).unwrap();
    assert_eq!(json, "\"yyyy-MM-dd\"");
    let back: DateFormat = serde_json::from_str(&json).unwrap();
    assert_eq!(back, a);
    assert!(serde_json::from_str::<DateFormat>("\"yyyy-QQ\"").is_err());
}

#[test]
fn mapping_default_covers_iso_and_epoch() {
    let f = DateFormat::mapping_default();
    assert!(f.parses("2021-05-01"));
    assert!(f.parses("1620000000000"));
}
