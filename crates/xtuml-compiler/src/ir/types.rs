//! The OAL data type vocabulary.

use std::fmt;

/// A declared OAL data type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OalType {
    Boolean,
    Integer,
    Real,
    String,
    UniqueId,
    Date,
    Timestamp,
    DateTime,
    Void,
    #[default]
    Any,
    Set,
    Bag,
    Sequence,
    /// `inst_ref<Class>`
    InstRef(String),
    /// `inst_ref_set<Class>`, or the bare `inst_ref_set`.
    InstRefSet(Option<String>),
    /// Anything outside the vocabulary. Rejected by validation.
    Unknown(String),
}

impl OalType {
    /// Parses a type name. Matching is case-insensitive; class names inside
    /// `inst_ref<...>` keep their spelling.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let lower = trimmed.to_ascii_lowercase();

        if let Some(class) = generic_argument(trimmed, "inst_ref_set") {
            return OalType::InstRefSet(Some(class));
        }
        if let Some(class) = generic_argument(trimmed, "inst_ref") {
            return OalType::InstRef(class);
        }

        match lower.as_str() {
            "boolean" => OalType::Boolean,
            "integer" => OalType::Integer,
            "real" => OalType::Real,
            "string" => OalType::String,
            "unique_id" => OalType::UniqueId,
            "date" => OalType::Date,
            "timestamp" => OalType::Timestamp,
            "datetime" => OalType::DateTime,
            "void" => OalType::Void,
            "any" => OalType::Any,
            "set" => OalType::Set,
            "bag" => OalType::Bag,
            "sequence" => OalType::Sequence,
            "inst_ref_set" => OalType::InstRefSet(None),
            _ => OalType::Unknown(trimmed.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, OalType::Unknown(_))
    }

    /// The class an instance reference points at.
    pub fn referenced_class(&self) -> Option<&str> {
        match self {
            OalType::InstRef(class) => Some(class),
            OalType::InstRefSet(Some(class)) => Some(class),
            _ => None,
        }
    }
}

impl fmt::Display for OalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OalType::Boolean => write!(f, "boolean"),
            OalType::Integer => write!(f, "integer"),
            OalType::Real => write!(f, "real"),
            OalType::String => write!(f, "string"),
            OalType::UniqueId => write!(f, "unique_id"),
            OalType::Date => write!(f, "date"),
            OalType::Timestamp => write!(f, "timestamp"),
            OalType::DateTime => write!(f, "datetime"),
            OalType::Void => write!(f, "void"),
            OalType::Any => write!(f, "any"),
            OalType::Set => write!(f, "set"),
            OalType::Bag => write!(f, "bag"),
            OalType::Sequence => write!(f, "sequence"),
            OalType::InstRef(class) => write!(f, "inst_ref<{}>", class),
            OalType::InstRefSet(Some(class)) => write!(f, "inst_ref_set<{}>", class),
            OalType::InstRefSet(None) => write!(f, "inst_ref_set"),
            OalType::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

fn generic_argument(text: &str, head: &str) -> Option<String> {
    let prefix = text.get(..head.len())?;
    if !prefix.eq_ignore_ascii_case(head) {
        return None;
    }
    let rest = text[head.len()..].trim_start();
    let inner = rest.strip_prefix('<')?.strip_suffix('>')?;
    Some(inner.trim().to_string())
}

/// A named, typed formal parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub data_type: OalType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, data_type: OalType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Parses `"a: integer, b: string, c"` into parameters. A part without a
/// colon is typed `any`; empty parts are dropped.
pub fn parse_parameters(text: &str) -> Vec<Parameter> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once(':') {
            Some((name, typ)) => Parameter::new(name.trim(), OalType::parse(typ)),
            None => Parameter::new(part, OalType::Any),
        })
        .collect()
}
