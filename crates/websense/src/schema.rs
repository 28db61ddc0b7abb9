//! Schema resolution: explicit schema, or one inferred from an example.

use serde_json::{json, Map, Value};

use crate::types::{ExampleSpec, SchemaSpec, WebSenseError, WebSenseResult};

/// Pick the schema for an extraction call.
///
/// An explicit, non-empty schema always wins. Otherwise the schema is
/// inferred from `example`. With neither, the call is misconfigured.
pub fn resolve(
    schema: Option<&SchemaSpec>,
    example: Option<&ExampleSpec>,
) -> WebSenseResult<SchemaSpec> {
    if let Some(schema) = schema.filter(|s| !is_blank(s)) {
        if !schema.is_object() {
            return Err(WebSenseError::Configuration(format!(
                "schema must be a JSON object, got {}",
                type_name(schema)
            )));
        }
        return Ok(schema.clone());
    }

    match example.filter(|e| !is_blank(e)) {
        Some(example) if example.is_object() || example.is_array() => {
            Ok(infer_from_example(example))
        }
        Some(example) => Err(WebSenseError::Configuration(format!(
            "example must be a JSON object or array, got {}",
            type_name(example)
        ))),
        None => Err(WebSenseError::Configuration(
            "must provide either a schema or an example".to_string(),
        )),
    }
}

/// Map a sample value to the JSON schema describing it.
pub fn infer_from_example(example: &ExampleSpec) -> SchemaSpec {
    match example {
        Value::Null => json!({ "type": "null" }),
        Value::Bool(_) => json!({ "type": "boolean" }),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "type": "integer" }),
        Value::Number(_) => json!({ "type": "number" }),
        Value::String(_) => json!({ "type": "string" }),
        Value::Array(items) => {
            let item_schema = items
                .first()
                .map(infer_from_example)
                .unwrap_or_else(|| json!({ "type": "string" }));
            json!({ "type": "array", "items": item_schema })
        }
        Value::Object(fields) => {
            let mut properties = Map::new();
            for (key, value) in fields {
                properties.insert(key.clone(), infer_from_example(value));
            }
            let required: Vec<Value> = fields.keys().cloned().map(Value::String).collect();
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
            })
        }
    }
}

/// Null and empty containers count as "not supplied".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_string_property() {
        let schema = resolve(None, Some(&json!({ "title": "x" }))).unwrap();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["title"]["type"], "string");
        assert_eq!(schema["required"], json!(["title"]));
    }

    #[test]
    fn explicit_schema_wins_over_example() {
        let schema = json!({ "type": "object", "properties": { "price": { "type": "number" } } });
        let example = json!({ "title": "x" });
        assert_eq!(resolve(Some(&schema), Some(&example)).unwrap(), schema);
    }

    #[test]
    fn neither_supplied_is_a_configuration_error() {
        let err = resolve(None, None).unwrap_err();
        match err {
            WebSenseError::Configuration(msg) => {
                assert!(msg.contains("schema"));
                assert!(msg.contains("example"));
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn empty_schema_falls_back_to_example() {
        let schema = resolve(Some(&json!({})), Some(&json!({ "n": 1 }))).unwrap();
        assert_eq!(schema["properties"]["n"]["type"], "integer");
        assert!(resolve(Some(&json!({})), None).is_err());
    }

    #[test]
    fn non_object_schema_rejected() {
        let err = resolve(Some(&json!("string")), None).unwrap_err();
        assert!(matches!(err, WebSenseError::Configuration(_)));
        let err = resolve(None, Some(&json!(42))).unwrap_err();
        assert!(matches!(err, WebSenseError::Configuration(_)));
    }

    #[test]
    fn infers_nested_structures() {
        let example = json!({
            "articles": [{ "title": "string", "points": 0, "score": 1.5, "hot": true }],
            "top_story": "string",
            "meta": { "tags": ["rust"], "editor": null },
            "empty": []
        });
        let schema = infer_from_example(&example);

        let article = &schema["properties"]["articles"];
        assert_eq!(article["type"], "array");
        assert_eq!(article["items"]["type"], "object");
        assert_eq!(article["items"]["properties"]["points"]["type"], "integer");
        assert_eq!(article["items"]["properties"]["score"]["type"], "number");
        assert_eq!(article["items"]["properties"]["hot"]["type"], "boolean");

        let meta = &schema["properties"]["meta"];
        assert_eq!(meta["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(meta["properties"]["editor"]["type"], "null");
        assert_eq!(schema["properties"]["empty"]["items"]["type"], "string");
    }

    #[test]
    fn inference_is_deterministic() {
        let example = json!({ "b": 1, "a": ["x"], "c": { "d": false } });
        assert_eq!(infer_from_example(&example), infer_from_example(&example));
        assert_eq!(
            infer_from_example(&example)["required"],
            json!(["b", "a", "c"])
        );
    }
}
