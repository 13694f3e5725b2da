//! Subset matching of a requested class against the class the service returns.
//!
//! The service echoes back every setting with its defaults filled in, so only
//! keys present in the request are compared. Property arrays pair entries by
//! name rather than position, and numbers compare with a small tolerance.

use crate::class::{ClassDefinition, ClassSnapshot};
use crate::primitives::{lower_first, upper_first};
use index_config_shared::ErrorEnvelope;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Absolute tolerance used when comparing numbers.
pub const NUMBER_TOLERANCE: f64 = 1e-9;

/// How a single path differs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MismatchKind {
    /// The path is absent from the returned class.
    Missing {
        /// Requested value.
        expected: Value,
    },
    /// The path is present with a different value.
    Different {
        /// Requested value.
        expected: Value,
        /// Returned value.
        actual: Value,
    },
}

/// A requested setting the returned class does not honor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaMismatch {
    /// Dotted path, with property entries written as `properties[name]`.
    pub path: String,
    /// How the value differs.
    #[serde(flatten)]
    pub kind: MismatchKind,
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MismatchKind::Missing { expected } => {
                write!(formatter, "{}: missing (expected {expected})", self.path)
            },
            MismatchKind::Different { expected, actual } => {
                write!(formatter, "{}: expected {expected}, got {actual}", self.path)
            },
        }
    }
}

/// Compare a requested class definition with the returned class.
pub fn match_class(
    expected: &ClassDefinition,
    actual: &ClassSnapshot,
) -> Result<Vec<SchemaMismatch>, ErrorEnvelope> {
    let payload = expected.to_payload()?;
    Ok(match_payload(&payload, actual.as_value()))
}

/// Compare a requested payload with a returned class object.
#[must_use]
pub fn match_payload(expected: &Value, actual: &Value) -> Vec<SchemaMismatch> {
    let mut mismatches = Vec::new();
    match_value("", Slot::Root, expected, actual, &mut mismatches);
    mismatches
}

/// Object kinds whose fields get special treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Root,
    Property,
    Other,
}

/// Where a value sits in the payload.
#[derive(Debug, Clone, Copy)]
enum Slot<'a> {
    Root,
    Property,
    Field { parent: Container, key: &'a str },
    Item,
}

impl Slot<'_> {
    const fn container(self) -> Container {
        match self {
            Self::Root => Container::Root,
            Self::Property => Container::Property,
            Self::Field { .. } | Self::Item => Container::Other,
        }
    }
}

fn match_value(
    path: &str,
    slot: Slot<'_>,
    expected: &Value,
    actual: &Value,
    out: &mut Vec<SchemaMismatch>,
) {
    match (expected, actual) {
        (Value::Object(expected_map), Value::Object(actual_map)) => {
            let parent = slot.container();
            for (child_key, expected_child) in expected_map {
                let child_path = join(path, child_key);
                match actual_map.get(child_key) {
                    Some(actual_child) => match_value(
                        &child_path,
                        Slot::Field {
                            parent,
                            key: child_key,
                        },
                        expected_child,
                        actual_child,
                        out,
                    ),
                    None => out.push(missing(child_path, expected_child)),
                }
            }
        },
        (Value::Array(expected_items), Value::Array(actual_items))
            if matches!(
                slot,
                Slot::Field {
                    parent: Container::Root,
                    key: "properties"
                }
            ) =>
        {
            match_properties(path, expected_items, actual_items, out);
        },
        (Value::Array(expected_items), Value::Array(actual_items)) => {
            if expected_items.len() != actual_items.len() {
                out.push(different(path, expected, actual));
                return;
            }
            for (index, (expected_item, actual_item)) in
                expected_items.iter().zip(actual_items).enumerate()
            {
                match_value(
                    &format!("{path}[{index}]"),
                    Slot::Item,
                    expected_item,
                    actual_item,
                    out,
                );
            }
        },
        (Value::Number(expected_number), Value::Number(actual_number)) => {
            let equal = match (expected_number.as_f64(), actual_number.as_f64()) {
                (Some(left), Some(right)) => (left - right).abs() <= NUMBER_TOLERANCE,
                _ => expected_number == actual_number,
            };
            if !equal {
                out.push(different(path, expected, actual));
            }
        },
        (Value::String(expected_text), Value::String(actual_text)) => {
            let equal = match slot {
                Slot::Field {
                    parent: Container::Root,
                    key: "class",
                } => upper_first(expected_text) == upper_first(actual_text),
                Slot::Field {
                    parent: Container::Property,
                    key: "name",
                } => lower_first(expected_text) == lower_first(actual_text),
                _ => expected_text == actual_text,
            };
            if !equal {
                out.push(different(path, expected, actual));
            }
        },
        _ => {
            if expected != actual {
                out.push(different(path, expected, actual));
            }
        },
    }
}

fn match_properties(
    path: &str,
    expected_items: &[Value],
    actual_items: &[Value],
    out: &mut Vec<SchemaMismatch>,
) {
    for (index, expected_item) in expected_items.iter().enumerate() {
        let Some(name) = property_name(expected_item) else {
            // Unnamed entries cannot be paired; fall back to position.
            let item_path = format!("{path}[{index}]");
            match actual_items.get(index) {
                Some(actual_item) => {
                    match_value(&item_path, Slot::Property, expected_item, actual_item, out);
                },
                None => out.push(missing(item_path, expected_item)),
            }
            continue;
        };
        let item_path = format!("{path}[{name}]");
        let paired = actual_items
            .iter()
            .find(|candidate| property_name(candidate).is_some_and(|other| other == name));
        match paired {
            Some(actual_item) => {
                match_value(&item_path, Slot::Property, expected_item, actual_item, out);
            },
            None => out.push(missing(item_path, expected_item)),
        }
    }
}

fn property_name(value: &Value) -> Option<String> {
    value
        .get("name")
        .and_then(Value::as_str)
        .map(lower_first)
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

fn missing(path: String, expected: &Value) -> SchemaMismatch {
    SchemaMismatch {
        path,
        kind: MismatchKind::Missing {
            expected: expected.clone(),
        },
    }
}

fn different(path: &str, expected: &Value, actual: &Value) -> SchemaMismatch {
    SchemaMismatch {
        path: path.to_owned(),
        kind: MismatchKind::Different {
            expected: expected.clone(),
            actual: actual.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extra_returned_keys_are_ignored() {
        let expected = json!({ "class": "Docs", "vectorIndexConfig": { "ef": -1 } });
        let actual = json!({
            "class": "Docs",
            "vectorIndexType": "hnsw",
            "vectorIndexConfig": { "ef": -1, "efConstruction": 128, "maxConnections": 32 }
        });
        assert!(match_payload(&expected, &actual).is_empty());
    }

    #[test]
    fn differing_and_missing_values_are_reported() {
        let expected = json!({
            "vectorIndexConfig": { "efConstruction": 256, "pq": { "enabled": true } }
        });
        let actual = json!({ "vectorIndexConfig": { "efConstruction": 128 } });
        let mismatches = match_payload(&expected, &actual);
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].path, "vectorIndexConfig.efConstruction");
        assert!(matches!(mismatches[0].kind, MismatchKind::Different { .. }));
        assert_eq!(mismatches[1].path, "vectorIndexConfig.pq");
        assert!(matches!(mismatches[1].kind, MismatchKind::Missing { .. }));
    }

    #[test]
    fn numbers_compare_with_tolerance() {
        let expected = json!({ "bm25": { "b": 0.7, "k1": 1 } });
        let actual = json!({ "bm25": { "b": 0.700_000_000_000_1, "k1": 1.0 } });
        assert!(match_payload(&expected, &actual).is_empty());

        let actual = json!({ "bm25": { "b": 0.75, "k1": 1.0 } });
        assert_eq!(match_payload(&expected, &actual).len(), 1);
    }

    #[test]
    fn properties_pair_by_name() {
        let expected = json!({
            "properties": [
                { "name": "title", "indexSearchable": true },
                { "name": "chunk", "indexRangeFilters": true }
            ]
        });
        let actual = json!({
            "properties": [
                { "name": "chunk", "dataType": ["int"], "indexRangeFilters": false },
                { "name": "title", "dataType": ["text"], "indexSearchable": true }
            ]
        });
        let mismatches = match_payload(&expected, &actual);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path, "properties[chunk].indexRangeFilters");
        assert_eq!(
            mismatches[0].to_string(),
            "properties[chunk].indexRangeFilters: expected true, got false"
        );
    }

    #[test]
    fn class_names_are_normalized() {
        let expected = json!({ "class": "configCollection" });
        let actual = json!({ "class": "ConfigCollection" });
        assert!(match_payload(&expected, &actual).is_empty());
    }

    #[test]
    fn nested_names_compare_exactly() {
        let expected = json!({
            "class": "Docs",
            "moduleConfig": { "generative-openai": { "name": "model" } },
            "properties": [{
                "name": "Title",
                "moduleConfig": { "text2vec-huggingface": { "class": "upper" } }
            }]
        });
        let actual = json!({
            "class": "docs",
            "moduleConfig": { "generative-openai": { "name": "Model" } },
            "properties": [{
                "name": "title",
                "moduleConfig": { "text2vec-huggingface": { "class": "Upper" } }
            }]
        });
        let paths: Vec<String> = match_payload(&expected, &actual)
            .into_iter()
            .map(|mismatch| mismatch.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "moduleConfig.generative-openai.name".to_owned(),
                "properties[title].moduleConfig.text2vec-huggingface.class".to_owned(),
            ]
        );
    }

    #[test]
    fn nested_property_arrays_compare_by_position() {
        let expected = json!({ "moduleConfig": { "m": { "properties": [{ "name": "a" }] } } });
        let actual = json!({ "moduleConfig": { "m": { "properties": [{ "name": "A" }] } } });
        assert_eq!(match_payload(&expected, &actual).len(), 1);
    }

    #[test]
    fn missing_property_is_reported() {
        let expected = json!({ "properties": [{ "name": "title" }] });
        let actual = json!({ "properties": [] });
        let mismatches = match_payload(&expected, &actual);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path, "properties[title]");
    }
}
