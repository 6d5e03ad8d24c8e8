//! Accessors over the loosely-shaped JSON model document.
//!
//! Documents come from several editors and spell the same field in
//! different ways. Every alias list lives here so the validator and the
//! normalizer accept exactly the same shapes.

use serde_json::Value;

use crate::ir::{parse_parameters, OalType, Parameter};

pub const REL_ID_KEYS: &[&str] = &["rel_id", "relId"];
pub const FROM_KEYS: &[&str] = &["from_class", "fromClass", "from", "super", "source_class"];
pub const TO_KEYS: &[&str] = &["to_class", "toClass", "to", "sub", "target_class"];
pub const FROM_MULTIPLICITY_KEYS: &[&str] = &["from_class_multiplicity", "fromMultiplicity"];
pub const TO_MULTIPLICITY_KEYS: &[&str] = &["to_class_multiplicity", "toMultiplicity"];

pub const SUPER_KEYS: &[&str] = &[
    "super",
    "super_class",
    "superClass",
    "superclass",
    "parent_class",
    "parent",
    "base",
    "super_type",
];
pub const SUB_KEYS: &[&str] = &[
    "sub",
    "sub_class",
    "subClass",
    "subclass",
    "child_class",
    "child",
    "specific",
    "sub_type",
];
pub const ASSOCIATION_KEYS: &[&str] = &[
    "association_class",
    "association_class_id",
    "assoc_class",
    "assoc_class_id",
];

/// Top-level array fields besides the class list.
pub const COLLECTION_KEYS: &[&str] = &["relationships", "events", "functions", "generalizations"];

/// Text of a scalar: strings as-is, numbers and booleans printed. Empty
/// strings and everything else count as absent.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First present alias of a text field.
pub fn text(object: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(scalar_text)
}

/// Array field, or an empty slice when missing or not an array.
pub fn array<'a>(object: &'a Value, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The class list lives under `model` or `classes`.
pub fn classes_field(document: &Value) -> Option<(&'static str, &Value)> {
    ["model", "classes"]
        .into_iter()
        .find_map(|key| match document.get(key) {
            Some(Value::Null) | None => None,
            Some(value) => Some((key, value)),
        })
}

pub fn classes(document: &Value) -> &[Value] {
    classes_field(document)
        .and_then(|(_, value)| value.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Boolean flag that may also be written as a string.
pub fn flag(object: &Value, key: &str) -> bool {
    match object.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

pub fn model_name(document: &Value) -> String {
    text(document, &["sub_name", "name", "model_name"]).unwrap_or_else(|| "xtuml_model".to_string())
}

/// True when a relationship entry describes a supertype/subtype pair.
pub fn is_generalization_relationship(rel: &Value) -> bool {
    let typed = text(rel, &["type", "rel_type"])
        .map(|t| t.eq_ignore_ascii_case("generalization") || t.eq_ignore_ascii_case("inheritance"))
        .unwrap_or(false);
    let tagged = ["kind", "category", "relationship_type"].iter().any(|key| {
        text(rel, &[key])
            .map(|t| t.eq_ignore_ascii_case("generalization"))
            .unwrap_or(false)
    });
    typed
        || tagged
        || flag(rel, "is_generalization")
        || rel.get("generalization") == Some(&Value::Bool(true))
        || (text(rel, &SUPER_KEYS[1..]).is_some() && text(rel, &SUB_KEYS[1..]).is_some())
}

/// Supertype and subtype references of a generalization-bearing
/// relationship. Explicit super/sub fields win over the from/to ends.
pub fn relationship_generalization_ends(rel: &Value) -> (Option<String>, Option<String>) {
    let super_ref = text(rel, &SUPER_KEYS[1..]).or_else(|| text(rel, &["from_class"]));
    let sub_ref = text(rel, &SUB_KEYS[1..]).or_else(|| text(rel, &["to_class"]));
    (super_ref, sub_ref)
}

/// Raw `state_event` signatures of a state row; scalar or list.
pub fn state_events(state: &Value) -> Vec<String> {
    match state.get("state_event") {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// `Deposit[amount: integer]` -> `Deposit`.
pub fn event_name(signature: &str) -> String {
    match (signature.find('['), signature.rfind(']')) {
        (Some(open), Some(close)) if close > open => {
            let mut name = signature[..open].to_string();
            name.push_str(&signature[close + 1..]);
            name.trim().to_string()
        }
        _ => signature.trim().to_string(),
    }
}

/// Action text: a string, or an array of lines.
pub fn action_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(lines)) => lines
            .iter()
            .map(|line| match line {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// `name(a: integer)` -> (`name`, `a: integer`).
pub fn split_signature(signature: &str) -> (String, Option<String>) {
    let signature = signature.trim();
    match (signature.find('('), signature.rfind(')')) {
        (Some(open), Some(close)) if close > open => {
            let head = signature[..open].trim();
            let name = head
                .rsplit(|c: char| !(c.is_alphanumeric() || c == '_'))
                .next()
                .unwrap_or(head);
            (name.to_string(), Some(signature[open + 1..close].to_string()))
        }
        _ => (signature.to_string(), None),
    }
}

/// Parameter list given as text, an array of `name: type` strings, or an
/// array of `{name, data_type|type}` objects.
pub fn parameters(value: &Value) -> Vec<Parameter> {
    match value {
        Value::String(s) => parse_parameters(s),
        Value::Array(items) => items.iter().flat_map(parameter_entry).collect(),
        _ => Vec::new(),
    }
}

fn parameter_entry(item: &Value) -> Vec<Parameter> {
    match item {
        Value::String(s) => parse_parameters(s),
        Value::Object(_) => {
            let Some(name) = text(item, &["name", "parameter_name", "param_name"]) else {
                return Vec::new();
            };
            let data_type = parameter_type(item).map(|t| OalType::parse(&t)).unwrap_or_default();
            vec![Parameter::new(name, data_type)]
        }
        _ => Vec::new(),
    }
}

/// Declared type text of a parameter object.
pub fn parameter_type(item: &Value) -> Option<String> {
    text(item, &["data_type", "type", "oalType"])
}

/// Parameters of an operation or function entry: an explicit list wins
/// over the signature text.
pub fn callable_parameters(entry: &Value) -> Vec<Parameter> {
    match entry {
        Value::String(sig) => split_signature(sig)
            .1
            .map(|p| parse_parameters(&p))
            .unwrap_or_default(),
        Value::Object(_) => {
            if let Some(explicit) = entry.get("parameters").or_else(|| entry.get("params")) {
                if !explicit.is_null() {
                    return parameters(explicit);
                }
            }
            callable_signature(entry)
                .and_then(|sig| split_signature(&sig).1)
                .map(|p| parse_parameters(&p))
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Signature text of an operation or function entry.
pub fn callable_signature(entry: &Value) -> Option<String> {
    match entry {
        Value::String(_) => scalar_text(entry),
        _ => text(entry, &["signature", "name"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_aliases() {
        let rel = json!({"relId": "R4", "fromClass": "A", "to": "B"});
        assert_eq!(text(&rel, REL_ID_KEYS).as_deref(), Some("R4"));
        assert_eq!(text(&rel, FROM_KEYS).as_deref(), Some("A"));
        assert_eq!(text(&rel, TO_KEYS).as_deref(), Some("B"));
        assert_eq!(text(&json!({"class_id": 7}), &["class_id"]).as_deref(), Some("7"));
        assert_eq!(text(&json!({"x": ""}), &["x"]), None);
    }

    #[test]
    fn finds_class_list_under_either_key() {
        let doc = json!({"model": [{"class_id": 1}]});
        assert_eq!(classes(&doc).len(), 1);
        let doc = json!({"classes": [{}, {}]});
        assert_eq!(classes(&doc).len(), 2);
        assert!(classes(&json!({})).is_empty());
    }

    #[test]
    fn detects_generalization_relationships() {
        assert!(is_generalization_relationship(&json!({"type": "Inheritance"})));
        assert!(is_generalization_relationship(&json!({"kind": "generalization"})));
        assert!(is_generalization_relationship(&json!({"generalization": true})));
        assert!(is_generalization_relationship(&json!({"parent": "A", "child": "B"})));
        assert!(!is_generalization_relationship(&json!({"from_class": "A", "to_class": "B"})));
    }

    #[test]
    fn strips_event_brackets() {
        assert_eq!(event_name("Deposit[amount: integer]"), "Deposit");
        assert_eq!(event_name(" Tick "), "Tick");
        let state = json!({"state_event": ["A[x]", "B"]});
        assert_eq!(state_events(&state), vec!["A[x]", "B"]);
        assert_eq!(state_events(&json!({"state_event": "C"})), vec!["C"]);
        assert!(state_events(&json!({})).is_empty());
    }

    #[test]
    fn joins_action_lines() {
        assert_eq!(action_text(Some(&json!(["a = 1;", "b = 2;"]))), "a = 1;\nb = 2;");
        assert_eq!(action_text(None), "");
    }

    #[test]
    fn parses_callable_parameters() {
        let (name, params) = split_signature("deposit(amount: integer)");
        assert_eq!(name, "deposit");
        assert_eq!(params.as_deref(), Some("amount: integer"));

        let op = json!({"signature": "refund()", "parameters": [{"name": "n", "type": "real"}]});
        let params = callable_parameters(&op);
        assert_eq!(params, vec![Parameter::new("n", OalType::Real)]);

        let op = json!("pay(a: integer, b)");
        let params = callable_parameters(&op);
        assert_eq!(params.len(), 2);
        assert_eq!(params[1].data_type, OalType::Any);
    }
}
