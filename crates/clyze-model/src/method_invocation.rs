use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::RecordError;
use crate::position::Position;

/// A method call site found in analyzed source.
///
/// Two invocations are equal when every field is equal, position included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInvocation {
    pub position: Position,
    #[serde(default)]
    pub source_file_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub invoking_method_doop_id: Option<String>,
    #[serde(default)]
    pub doop_id: Option<String>,
    /// Call site is inside an instance initializer block
    #[serde(rename = "inIIB")]
    pub in_iib: bool,
}

impl MethodInvocation {
    #[must_use]
    pub fn new(
        position: Position,
        source_file_name: impl Into<String>,
        name: impl Into<String>,
        doop_id: impl Into<String>,
        invoking_method_doop_id: impl Into<String>,
        in_iib: bool,
    ) -> Self {
        Self {
            position,
            source_file_name: Some(source_file_name.into()),
            name: Some(name.into()),
            invoking_method_doop_id: Some(invoking_method_doop_id.into()),
            doop_id: Some(doop_id.into()),
            in_iib,
        }
    }

    /// Write this record as a string-keyed map. Absent strings become `null`.
    ///
    /// # Errors
    ///
    /// [`RecordError::Encode`] if the record does not serialize to a JSON object.
    pub fn save_to(&self) -> Result<Map<String, Value>, RecordError> {
        let encode_failed = |source| RecordError::Encode {
            record: "MethodInvocation",
            source,
        };
        match serde_json::to_value(self).map_err(encode_failed)? {
            Value::Object(map) => Ok(map),
            other => Err(encode_failed(serde::ser::Error::custom(format!(
                "expected an object, got {other}"
            )))),
        }
    }

    /// Read a record back from a map written by [`save_to`](Self::save_to).
    ///
    /// Unknown keys are ignored; string keys may be missing or `null`.
    ///
    /// # Errors
    ///
    /// [`RecordError::Shape`] if `position` or `inIIB` is missing, or any
    /// value has the wrong type.
    pub fn load_from(map: &Map<String, Value>) -> Result<Self, RecordError> {
        serde_json::from_value(Value::Object(map.clone())).map_err(|source| RecordError::Shape {
            record: "MethodInvocation",
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> MethodInvocation {
        MethodInvocation::new(
            Position::new(10, 4, 10, 22),
            "src/Main.java",
            "println",
            "<java.io.PrintStream: void println(java.lang.String)>/0",
            "<Main: void main(java.lang.String[])>",
            false,
        )
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_save_uses_camel_case_keys() {
        let map = sample().save_to().unwrap();
        let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["doopId", "inIIB", "invokingMethodDoopId", "name", "position", "sourceFileName"]
        );
        assert_eq!(map["position"]["startColumn"], json!(4));
        assert_eq!(map["inIIB"], json!(false));
    }

    #[test]
    fn test_save_matches_serialized_record() {
        let record = sample();
        assert_eq!(Value::Object(record.save_to().unwrap()), serde_json::to_value(&record).unwrap());
    }

    #[test]
    fn test_round_trip() {
        let record = sample();
        assert_eq!(MethodInvocation::load_from(&record.save_to().unwrap()).unwrap(), record);
    }

    #[test]
    fn test_absent_strings_saved_as_null() {
        let record = MethodInvocation {
            in_iib: true,
            ..MethodInvocation::default()
        };
        let map = record.save_to().unwrap();
        assert_eq!(map["name"], Value::Null);
        assert_eq!(MethodInvocation::load_from(&map).unwrap(), record);
    }

    #[test]
    fn test_missing_optional_keys_load_as_none() {
        let map = as_map(json!({
            "position": {"startLine": 1, "startColumn": 1, "endLine": 1, "endColumn": 5},
            "inIIB": true,
        }));
        let record = MethodInvocation::load_from(&map).unwrap();
        assert!(record.in_iib);
        assert_eq!(record.name, None);
        assert_eq!(record.doop_id, None);
    }

    #[test]
    fn test_missing_in_iib_fails() {
        let mut map = sample().save_to().unwrap();
        map.remove("inIIB");
        let err = MethodInvocation::load_from(&map).unwrap_err();
        assert!(err.to_string().contains("inIIB"));
    }

    #[test]
    fn test_missing_position_fails() {
        let mut map = sample().save_to().unwrap();
        map.remove("position");
        assert!(MethodInvocation::load_from(&map).is_err());
    }

    #[test]
    fn test_wrong_type_fails() {
        let mut map = sample().save_to().unwrap();
        map.insert("name".into(), json!(42));
        assert!(matches!(
            MethodInvocation::load_from(&map),
            Err(RecordError::Shape { record: "MethodInvocation", .. })
        ));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut map = sample().save_to().unwrap();
        map.insert("symbolId".into(), json!("x"));
        assert_eq!(MethodInvocation::load_from(&map).unwrap(), sample());
    }

    #[test]
    fn test_equality_includes_position() {
        let mut moved = sample();
        moved.position.start_line += 1;
        assert_ne!(moved, sample());
    }
}
