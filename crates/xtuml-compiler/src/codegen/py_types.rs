//! Python type and literal generation from OAL types.

use serde_json::Value;

use crate::ir::{Attribute, OalType};

const PY_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Converts an OAL type to a Python type annotation.
pub fn to_py_type(typ: &OalType) -> String {
    match typ {
        OalType::Boolean => "bool".to_string(),
        OalType::Integer => "int".to_string(),
        OalType::Real | OalType::Timestamp => "float".to_string(),
        OalType::String | OalType::Date | OalType::DateTime | OalType::UniqueId => {
            "str".to_string()
        }
        OalType::Void => "None".to_string(),
        OalType::Set => "set".to_string(),
        OalType::Bag | OalType::Sequence | OalType::InstRefSet(None) => "list".to_string(),
        OalType::InstRef(class) => format!("Optional['{}']", class),
        OalType::InstRefSet(Some(class)) => format!("List['{}']", class),
        OalType::Any | OalType::Unknown(_) => "Any".to_string(),
    }
}

/// The literal an attribute of this type starts with.
pub fn default_literal(typ: &OalType) -> String {
    match typ {
        OalType::Boolean => "False",
        OalType::Integer => "0",
        OalType::Real | OalType::Timestamp => "0.0",
        OalType::String | OalType::Date | OalType::DateTime => "''",
        OalType::UniqueId => "str(uuid.uuid4())",
        OalType::Set => "set()",
        OalType::Bag | OalType::Sequence | OalType::InstRefSet(_) => "[]",
        OalType::Void | OalType::Any | OalType::InstRef(_) | OalType::Unknown(_) => "None",
    }
    .to_string()
}

/// Default for an operation or function parameter. Mutable and generated
/// values default to `None` so calls never share them.
pub fn parameter_default(typ: &OalType) -> String {
    match typ {
        OalType::UniqueId
        | OalType::Set
        | OalType::Bag
        | OalType::Sequence
        | OalType::InstRefSet(_) => "None".to_string(),
        other => default_literal(other),
    }
}

/// Converts a model-supplied default value to a Python literal of `typ`.
pub fn value_literal(value: &Value, typ: &OalType) -> String {
    if value.is_null() {
        return "None".to_string();
    }

    match typ {
        OalType::Boolean => py_bool(match value {
            Value::Bool(b) => *b,
            Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            _ => true,
        }),
        OalType::Integer => match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .unwrap_or(0)
                .to_string(),
            Value::String(s) => leading_integer(s).to_string(),
            Value::Bool(b) => i64::from(*b).to_string(),
            _ => "0".to_string(),
        },
        OalType::Real => {
            let number = match value {
                Value::Number(n) => n.as_f64().unwrap_or(0.0),
                Value::String(s) => leading_float(s),
                _ => 0.0,
            };
            py_float(number)
        }
        OalType::String | OalType::Date | OalType::DateTime => match value {
            Value::String(s) => py_string(s),
            other => py_string(&other.to_string()),
        },
        OalType::InstRef(_) | OalType::InstRefSet(_) => "None".to_string(),
        _ => match value {
            Value::String(s) => py_string(s),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => py_bool(*b),
            other => py_string(&other.to_string()),
        },
    }
}

/// Initializer expression for an attribute.
pub fn attribute_initializer(attribute: &Attribute) -> String {
    match &attribute.default_value {
        Some(value) if !value.is_null() => value_literal(value, &attribute.data_type),
        _ => default_literal(&attribute.data_type),
    }
}

/// Double-quoted, escaped Python string literal.
pub fn py_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn py_bool(b: bool) -> String {
    if b { "True" } else { "False" }.to_string()
}

/// Float literal that always carries a decimal point.
pub fn py_float(number: f64) -> String {
    if !number.is_finite() {
        return "0.0".to_string();
    }
    if number.fract() == 0.0 {
        format!("{:.1}", number)
    } else {
        number.to_string()
    }
}

/// Sanitizes a model name into a Python identifier. Keywords get a
/// trailing underscore.
pub fn py_ident(name: &str) -> String {
    let mut ident: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() {
        ident.push('_');
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if PY_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// Integer prefix of `text` after leading whitespace, like `parseInt`.
fn leading_integer(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let end = trimmed
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    trimmed[..end].parse().unwrap_or(0)
}

/// Float prefix of `text`, like `parseFloat`.
fn leading_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes = trimmed.as_bytes();
    while end < bytes.len() {
        let c = bytes[end] as char;
        let sign_ok = (end == 0 || matches!(bytes[end - 1], b'e' | b'E')) && (c == '-' || c == '+');
        if c.is_ascii_digit() || sign_ok {
            end += 1;
        } else if c == '.' && !seen_dot && !seen_exp {
            seen_dot = true;
            end += 1;
        } else if (c == 'e' || c == 'E') && !seen_exp && end > 0 {
            seen_exp = true;
            end += 1;
        } else {
            break;
        }
    }
    // Back off an incomplete exponent or sign.
    let mut candidate = &trimmed[..end];
    while !candidate.is_empty() {
        if let Ok(v) = candidate.parse::<f64>() {
            return v;
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    0.0
}
