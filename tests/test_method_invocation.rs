//! Boundary tests for the `MethodInvocation` record
//!
//! Records arrive as JSON objects written by analysis tools; these tests go
//! through real JSON text rather than hand-built maps.

use clyze::{MethodInvocation, Position, RecordError};
use serde_json::{Map, Value};

fn parse_object(json: &str) -> Map<String, Value> {
    match serde_json::from_str(json).unwrap() {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn test_load_from_tool_output() {
    let map = parse_object(
        r#"{
            "position": {"startLine": 12, "startColumn": 9, "endLine": 12, "endColumn": 31},
            "sourceFileName": "src/main/java/App.java",
            "name": "run",
            "invokingMethodDoopId": "<App: void main(java.lang.String[])>",
            "doopId": "<App: void main(java.lang.String[])>/App.run/0",
            "inIIB": false,
            "symbolId": "ignored-by-this-record"
        }"#,
    );

    let record = MethodInvocation::load_from(&map).unwrap();

    assert_eq!(record.position, Position::new(12, 9, 12, 31));
    assert_eq!(record.name.as_deref(), Some("run"));
    assert_eq!(
        record.doop_id.as_deref(),
        Some("<App: void main(java.lang.String[])>/App.run/0")
    );
    assert!(!record.in_iib);
}

#[test]
fn test_saved_map_serializes_with_expected_keys() {
    let record = MethodInvocation::new(
        Position::new(1, 2, 3, 4),
        "A.java",
        "<init>",
        "A.<init>/0",
        "<A: void <clinit>()>",
        true,
    );

    let json = serde_json::to_string(&Value::Object(record.save_to().unwrap())).unwrap();
    let back = parse_object(&json);

    assert_eq!(back["inIIB"], Value::Bool(true));
    assert_eq!(back["invokingMethodDoopId"], Value::from("<A: void <clinit>()>"));
    assert_eq!(MethodInvocation::load_from(&back).unwrap(), record);
}

#[test]
fn test_null_strings_accepted() {
    let map = parse_object(
        r#"{"position": {"startLine": 0, "startColumn": 0, "endLine": 0, "endColumn": 0},
            "sourceFileName": null, "name": null, "invokingMethodDoopId": null,
            "doopId": null, "inIIB": true}"#,
    );
    let record = MethodInvocation::load_from(&map).unwrap();
    assert_eq!(record.source_file_name, None);
    assert!(record.in_iib);
}

#[test]
fn test_wrongly_typed_flag_is_a_shape_error() {
    let map = parse_object(
        r#"{"position": {"startLine": 0, "startColumn": 0, "endLine": 0, "endColumn": 0},
            "inIIB": "yes"}"#,
    );
    let err = MethodInvocation::load_from(&map).unwrap_err();
    assert!(matches!(err, RecordError::Shape { .. }));
    assert!(err.to_string().starts_with("Malformed MethodInvocation record"));
}

#[test]
fn test_facade_error_wraps_record_error() {
    let err = MethodInvocation::load_from(&Map::new()).unwrap_err();
    let err: clyze::Error = err.into();
    assert!(matches!(err, clyze::Error::Record(_)));
}
