//! # Instance Documents
//!
//! Loads documents to validate from disk. `.yaml` / `.yml` files are parsed
//! as YAML and converted to the equivalent JSON value; anything else is
//! parsed as JSON.

use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::registry::RegistryError;

/// Read and parse a JSON or YAML document.
///
/// # Errors
///
/// `RegistryError::Document` if the file cannot be read, does not parse, or
/// uses YAML features with no JSON equivalent.
pub fn load_document(path: &Path) -> Result<Value, RegistryError> {
    let failure = |reason: String| RegistryError::Document {
        path: path.display().to_string(),
        reason,
    };

    let content =
        std::fs::read_to_string(path).map_err(|e| failure(format!("cannot read file: {e}")))?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| matches!(ext, "yaml" | "yml"));

    if is_yaml {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|e| failure(format!("invalid YAML: {e}")))?;
        yaml_to_json_value(&yaml).map_err(failure)
    } else {
        serde_json::from_str(&content).map_err(|e| failure(format!("invalid JSON: {e}")))
    }
}

/// Convert a YAML value tree into a JSON value tree.
///
/// Tags are discarded. Scalar map keys are stringified; sequence or mapping
/// keys and non-finite floats are rejected.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Y;

    Ok(match yaml {
        Y::Null => Value::Null,
        Y::Bool(b) => Value::Bool(*b),
        Y::String(s) => Value::String(s.clone()),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("number {n} has no JSON representation"))?
            }
        }
        Y::Sequence(items) => Value::Array(
            items
                .iter()
                .map(yaml_to_json_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Y::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = match key {
                    Y::String(s) => s.clone(),
                    Y::Bool(b) => b.to_string(),
                    Y::Number(n) => n.to_string(),
                    Y::Null => "null".to_string(),
                    other => return Err(format!("unsupported mapping key: {other:?}")),
                };
                object.insert(key, yaml_to_json_value(value)?);
            }
            Value::Object(object)
        }
        Y::Tagged(tagged) => yaml_to_json_value(&tagged.value)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_nested_yaml() {
        let yaml: serde_yaml::Value = serde_yaml::from_str(
            r#"
name: ada
age: 36
ratio: 0.5
active: true
tags: [a, b]
1: numeric-key
"#,
        )
        .unwrap();
        let value = yaml_to_json_value(&yaml).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "ada",
                "age": 36,
                "ratio": 0.5,
                "active": true,
                "tags": ["a", "b"],
                "1": "numeric-key"
            })
        );
    }

    #[test]
    fn rejects_non_finite_floats() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("x: .nan").unwrap();
        assert!(yaml_to_json_value(&yaml).is_err());
    }

    #[test]
    fn rejects_complex_keys() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("? [a, b]\n: 1\n").unwrap();
        assert!(yaml_to_json_value(&yaml).is_err());
    }

    #[test]
    fn loads_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("doc.json");
        let yaml_path = dir.path().join("doc.yml");
        std::fs::write(&json_path, r#"{"k": [1, 2]}"#).unwrap();
        std::fs::write(&yaml_path, "k:\n  - 1\n  - 2\n").unwrap();

        assert_eq!(load_document(&json_path).unwrap(), json!({"k": [1, 2]}));
        assert_eq!(load_document(&yaml_path).unwrap(), json!({"k": [1, 2]}));
    }

    #[test]
    fn missing_and_malformed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_document(&missing),
            Err(RegistryError::Document { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{").unwrap();
        let err = load_document(&bad).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"), "got {err}");
    }
}
