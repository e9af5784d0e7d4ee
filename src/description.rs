//! Wire form of a sum-type description, as handed over by whatever discovered
//! the type (annotation processor, reflection dump, hand-written manifest).
//!
//! Nothing here is validated beyond JSON shape; `definition::build` owns the
//! structural checks.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumTypeDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default = "closed_by_default")]
    pub closed: bool,
    #[serde(default)]
    pub alternatives: Vec<AlternativeDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeDescription {
    pub name: String,
    #[serde(flatten)]
    pub shape: Shape,
}

/// How an alternative decomposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Record {
        #[serde(default)]
        fields: Vec<FieldDescription>,
    },
    Sum {
        #[serde(default)]
        alternatives: Vec<AlternativeDescription>,
    },
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

fn closed_by_default() -> bool {
    true
}

/// Parse one JSON document into descriptions. A document holds a single
/// description or a list of them.
pub fn parse_descriptions(src: &str) -> Result<Vec<SumTypeDescription>, String> {
    if src.trim_start().starts_with('[') {
        from_str_with_path::<Vec<SumTypeDescription>>(src)
    } else {
        from_str_with_path::<SumTypeDescription>(src).map(|d| vec![d])
    }
}

/// Same as [`parse_descriptions`] for an already-parsed JSON value.
pub fn descriptions_from_value(value: serde_json::Value) -> Result<Vec<SumTypeDescription>, String> {
    let is_array = value.is_array();
    let result = if is_array {
        serde_path_to_error::deserialize::<_, Vec<SumTypeDescription>>(value)
    } else {
        serde_path_to_error::deserialize::<_, SumTypeDescription>(value).map(|d| vec![d])
    };
    result.map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path} → {}", err.into_inner())
    })
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: &str = r#"{
        "name": "com.acme.Range",
        "alternatives": [
            { "name": "com.acme.Range.Closed", "kind": "record",
              "fields": [ { "name": "start", "type": "java.time.LocalDate" },
                          { "name": "end",   "type": "java.time.LocalDate" } ] },
            { "name": "com.acme.Range.Open", "kind": "record",
              "fields": [ { "name": "start", "type": "java.time.LocalDate" } ] }
        ]
    }"#;

    #[test]
    fn single_object_document() {
        let xs = parse_descriptions(RANGE).unwrap();
        assert_eq!(xs.len(), 1);
        let range = &xs[0];
        assert!(range.closed, "closed defaults to true");
        assert_eq!(range.package, None);
        assert_eq!(range.alternatives.len(), 2);
        match &range.alternatives[0].shape {
            Shape::Record { fields } => {
                assert_eq!(fields[0].name, "start");
                assert_eq!(fields[1].ty, "java.time.LocalDate");
            }
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn array_document() {
        let src = format!("[{RANGE}, {RANGE}]");
        assert_eq!(parse_descriptions(&src).unwrap().len(), 2);
    }

    #[test]
    fn nested_and_opaque_shapes_parse() {
        let src = r#"{
            "name": "a.Outer",
            "alternatives": [
                { "name": "a.Outer.Inner", "kind": "sum", "alternatives": [
                    { "name": "a.Outer.Inner.X", "kind": "record" }
                ] },
                { "name": "a.Outer.Blob", "kind": "opaque" }
            ]
        }"#;
        let xs = parse_descriptions(src).unwrap();
        assert!(matches!(xs[0].alternatives[0].shape, Shape::Sum { .. }));
        assert_eq!(xs[0].alternatives[1].shape, Shape::Opaque);
    }

    #[test]
    fn errors_carry_the_json_path() {
        let src = r#"{ "name": "a.B", "alternatives": [
            { "name": "a.B.C", "kind": "record", "fields": [ { "name": "x" } ] }
        ] }"#;
        let err = parse_descriptions(src).unwrap_err();
        assert!(err.contains("alternatives"), "{err}");
        assert!(err.contains("type"), "{err}");
    }

    #[test]
    fn scalar_documents_are_rejected() {
        assert!(parse_descriptions("42").is_err());
        assert!(parse_descriptions("  \"a.B\"").is_err());
    }

    #[test]
    fn value_documents() {
        let value: serde_json::Value = serde_json::from_str(RANGE).unwrap();
        let xs = descriptions_from_value(serde_json::Value::Array(vec![value])).unwrap();
        assert_eq!(xs[0].name, "com.acme.Range");
    }
}
