#![allow(dead_code)]

use serde_json::Value;
use std::sync::Arc;
use xmlmap::{Settings, Tree};

pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>"#;
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub const LALIT_NAMESPACE: &str = "http://www.digitickets.co.uk/lalit";

pub fn default_settings() -> Arc<Settings> {
    Arc::new(Settings::default())
}

pub fn all_namespaces_settings() -> Arc<Settings> {
    Arc::new(
        Settings::default()
            .with_include_all_namespaces(true)
            .with_include_default_xml_namespace(true),
    )
}

/// Asserts that two trees describe the same document, listing every
/// difference of their normalized JSON forms on failure.
pub fn assert_same_tree(expected: &Tree, actual: &Tree, context: &str) {
    let expected = expected.normalized().to_json();
    let actual = actual.normalized().to_json();

    let mut differences = Vec::new();
    compare_json_values(&expected, &actual, String::new(), &mut differences);

    if !differences.is_empty() {
        let mut report = format!("{context}: {} difference(s)\n", differences.len());
        for (path, left, right) in &differences {
            report.push_str(&format!("  {path}: expected {left}, got {right}\n"));
        }
        panic!("{report}");
    }
}

/// Recursively compares two JSON values, recording `(path, expected, actual)`
/// for every mismatch. Object keys must also appear in the same order.
pub fn compare_json_values(
    expected: &Value,
    actual: &Value,
    path: String,
    differences: &mut Vec<(String, Value, Value)>,
) {
    match (expected, actual) {
        (Value::Object(expected_obj), Value::Object(actual_obj)) => {
            let expected_keys: Vec<&String> = expected_obj.keys().collect();
            let actual_keys: Vec<&String> = actual_obj.keys().collect();
            if expected_keys != actual_keys {
                differences.push((
                    format!("{path} (keys)"),
                    Value::from(expected_keys.iter().map(|k| k.as_str()).collect::<Vec<_>>()),
                    Value::from(actual_keys.iter().map(|k| k.as_str()).collect::<Vec<_>>()),
                ));
            }

            for (key, expected_value) in expected_obj {
                let new_path = if path.is_empty() {
                    key.to_string()
                } else {
                    format!("{}.{}", path, key)
                };
                match actual_obj.get(key) {
                    Some(actual_value) => {
                        compare_json_values(expected_value, actual_value, new_path, differences)
                    }
                    None => differences.push((new_path, expected_value.clone(), Value::Null)),
                }
            }
        }
        (Value::Array(expected_arr), Value::Array(actual_arr)) => {
            if expected_arr.len() != actual_arr.len() {
                differences.push((
                    format!("{path} (length)"),
                    Value::from(expected_arr.len()),
                    Value::from(actual_arr.len()),
                ));
                return;
            }
            for (i, (expected_value, actual_value)) in
                expected_arr.iter().zip(actual_arr.iter()).enumerate()
            {
                compare_json_values(
                    expected_value,
                    actual_value,
                    format!("{}[{}]", path, i),
                    differences,
                );
            }
        }
        _ => {
            if expected != actual {
                differences.push((path, expected.clone(), actual.clone()));
            }
        }
    }
}
