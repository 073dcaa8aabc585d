//! Flat-schema validation and GBNF grammar derivation for template output
//! constraints.

use crate::error::{Error, Result};
use serde_json::Value;

/// Confirm `schema` is a flat JSON Schema object: an `object` type with
/// top-level `properties` only, none of which are themselves `object` or
/// an array of objects. Distillation refuses to save a template whose
/// schema fails this check.
pub fn validate_flat(schema: &Value) -> Result<()> {
    let obj = schema
        .as_object()
        .ok_or_else(|| Error::NonFlatSchema("schema root is not a JSON object".into()))?;

    let properties = match obj.get("properties") {
        Some(Value::Object(props)) => props,
        Some(_) => return Err(Error::NonFlatSchema("`properties` is not an object".into())),
        None => return Ok(()),
    };

    for (name, prop) in properties {
        if is_nested(prop) {
            return Err(Error::NonFlatSchema(format!(
                "property `{name}` is nested (objects and arrays-of-objects aren't flat)"
            )));
        }
    }

    Ok(())
}

fn is_nested(prop: &Value) -> bool {
    match prop.get("type").and_then(Value::as_str) {
        Some("object") => true,
        Some("array") => prop
            .get("items")
            .map(|items| matches!(items.get("type").and_then(Value::as_str), Some("object")))
            .unwrap_or(false),
        _ => false,
    }
}

/// Derive a GBNF grammar constraining output to the shape of `schema`.
/// Only a subset of JSON Schema is supported (string/number/integer/
/// boolean/enum properties); anything else yields an error, which the
/// caller treats as non-fatal and falls back to an unconstrained template.
pub fn derive_grammar(schema: &Value) -> Result<String> {
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::NonFlatSchema("schema has no `properties` object".into()))?;

    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut fields = Vec::new();
    for (name, prop) in properties {
        let rule = gbnf_value_rule(prop)?;
        let optional = !required.contains(&name.as_str());
        fields.push((name.clone(), rule, optional));
    }
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let mut grammar = String::from("root ::= \"{\" ");
    for (i, (name, rule, optional)) in fields.iter().enumerate() {
        if i > 0 {
            grammar.push_str("\",\" ");
        }
        let field = format!("\"\\\"{name}\\\":\" {rule}");
        if *optional {
            grammar.push_str(&format!("({field})? "));
        } else {
            grammar.push_str(&field);
            grammar.push(' ');
        }
    }
    grammar.push_str("\"}\"\n");
    grammar.push_str("string ::= \"\\\"\" [^\"]* \"\\\"\"\n");
    grammar.push_str("number ::= \"-\"? [0-9]+ (\".\" [0-9]+)?\n");
    grammar.push_str("integer ::= \"-\"? [0-9]+\n");
    grammar.push_str("boolean ::= \"true\" | \"false\"\n");

    Ok(grammar)
}

fn gbnf_value_rule(prop: &Value) -> Result<String> {
    if let Some(values) = prop.get("enum").and_then(Value::as_array) {
        let alternatives: Vec<String> = values
            .iter()
            .map(|v| match v {
                Value::String(s) => format!("\"\\\"{s}\\\"\""),
                other => format!("\"{other}\""),
            })
            .collect();
        return Ok(format!("({})", alternatives.join(" | ")));
    }

    match prop.get("type").and_then(Value::as_str) {
        Some("string") => Ok("string".to_string()),
        Some("number") => Ok("number".to_string()),
        Some("integer") => Ok("integer".to_string()),
        Some("boolean") => Ok("boolean".to_string()),
        other => Err(Error::NonFlatSchema(format!(
            "unsupported property type for grammar derivation: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_schema_passes() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer"}
            }
        });
        assert!(validate_flat(&schema).is_ok());
    }

    #[test]
    fn nested_object_property_fails() {
        let schema = json!({
            "type": "object",
            "properties": {
                "address": {"type": "object", "properties": {"city": {"type": "string"}}}
            }
        });
        assert!(validate_flat(&schema).is_err());
    }

    #[test]
    fn array_of_objects_fails() {
        let schema = json!({
            "type": "object",
            "properties": {
                "items": {"type": "array", "items": {"type": "object"}}
            }
        });
        assert!(validate_flat(&schema).is_err());
    }

    #[test]
    fn array_of_scalars_is_flat() {
        let schema = json!({
            "type": "object",
            "properties": {
                "tags": {"type": "array", "items": {"type": "string"}}
            }
        });
        assert!(validate_flat(&schema).is_ok());
    }

    #[test]
    fn derive_grammar_covers_required_and_optional_fields() {
        let schema = json!({
            "type": "object",
            "properties": {
                "answer": {"type": "string"},
                "confidence": {"type": "number"}
            },
            "required": ["answer"]
        });
        let grammar = derive_grammar(&schema).unwrap();
        assert!(grammar.contains("root ::="));
        assert!(grammar.contains("\"answer\\\":\" string"));
        assert!(grammar.contains("(\"\\\"confidence\\\":\" number)?"));
    }

    #[test]
    fn derive_grammar_rejects_unsupported_nested_shapes() {
        let schema = json!({
            "type": "object",
            "properties": {
                "meta": {"type": "object"}
            }
        });
        assert!(derive_grammar(&schema).is_err());
    }
}
