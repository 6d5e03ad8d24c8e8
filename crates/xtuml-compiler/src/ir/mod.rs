//! The normalized, language-independent model.
//!
//! Produced once by the normalizer and only read afterwards. Classes live in
//! a single arena (`Model::classes`) and every cross-reference is a
//! [`ClassId`] into it, so supertype/subtype and relationship ends never own
//! each other.

mod types;

pub use types::{parse_parameters, OalType, Parameter};

use serde_json::Value;

/// Stable handle of a class in [`Model::classes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub usize);

/// The complete compiled model.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub classes: Vec<Class>,
    pub relationships: Vec<Relationship>,
    pub generalizations: Vec<Generalization>,
    pub events: Vec<EventDef>,
    pub functions: Vec<Function>,
    pub association_classes: Vec<AssociationClass>,
}

impl Model {
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0]
    }

    /// Resolves a class by id, name or key letters (case-insensitive).
    pub fn resolve_class(&self, reference: &str) -> Option<ClassId> {
        let wanted = reference.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.classes
            .iter()
            .position(|c| c.matches(&wanted))
            .map(ClassId)
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len()).map(ClassId)
    }

    /// Looks up an event definition by name (case-insensitive), preferring
    /// the one declared for `class`.
    pub fn event(&self, name: &str, class: Option<ClassId>) -> Option<&EventDef> {
        let mut candidates = self
            .events
            .iter()
            .filter(|e| e.name.eq_ignore_ascii_case(name));
        let first = candidates.clone().next();
        candidates.find(|e| e.class.is_some() && e.class == class).or(first)
    }

    pub fn relationship(&self, rel_id: &str) -> Option<&Relationship> {
        self.relationships
            .iter()
            .find(|r| r.rel_id.eq_ignore_ascii_case(rel_id))
    }

    pub fn has_functions(&self) -> bool {
        !self.functions.is_empty()
    }
}

/// A model class.
#[derive(Debug, Clone, Default)]
pub struct Class {
    pub id: String,
    pub name: String,
    pub key_letters: String,
    /// Unique Python identifier used for the class and its module.
    pub py_name: String,
    pub is_external: bool,
    pub attributes: Vec<Attribute>,
    pub operations: Vec<Operation>,
    pub state_machine: Option<StateMachine>,
    pub super_class: Option<ClassId>,
    pub sub_classes: Vec<ClassId>,
}

impl Class {
    /// True if `lowered` equals the id, name or key letters (already lowercased).
    pub fn matches(&self, lowered: &str) -> bool {
        self.id.to_lowercase() == lowered
            || self.name.to_lowercase() == lowered
            || self.key_letters.to_lowercase() == lowered
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|o| o.name == name)
    }
}

/// A class attribute.
#[derive(Debug, Clone, Default)]
pub struct Attribute {
    pub name: String,
    pub data_type: OalType,
    pub default_value: Option<Value>,
    pub related_class: Option<ClassId>,
    pub relationship_id: Option<String>,
}

/// A class operation.
#[derive(Debug, Clone, Default)]
pub struct Operation {
    pub name: String,
    pub signature: String,
    pub parameters: Vec<Parameter>,
    pub action: String,
}

/// A free function (domain function).
#[derive(Debug, Clone, Default)]
pub struct Function {
    pub name: String,
    pub signature: String,
    pub parameters: Vec<Parameter>,
    pub action: String,
}

/// A per-class state machine.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    pub initial_state: String,
    pub states: Vec<State>,
    pub transitions: Vec<Transition>,
}

impl StateMachine {
    pub fn has_state(&self, name: &str) -> bool {
        self.states.iter().any(|s| s.name == name)
    }

    /// The origin state of the first transition triggered by `event`.
    pub fn origin_of(&self, event: &str) -> Option<&str> {
        self.transitions
            .iter()
            .find(|t| t.event == event)
            .map(|t| t.from.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub id: String,
    pub name: String,
}

/// One `(from, event) -> to` entry. `guard` is reserved and always empty
/// for models read from JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub from: String,
    pub event: String,
    pub event_signature: String,
    pub event_parameters: Vec<Parameter>,
    pub guard: Option<String>,
    pub action: String,
    pub to: String,
}

/// A declared event.
#[derive(Debug, Clone, Default)]
pub struct EventDef {
    pub name: String,
    pub class: Option<ClassId>,
    pub parameters: Vec<Parameter>,
}

/// A binary association.
#[derive(Debug, Clone, Default)]
pub struct Relationship {
    pub rel_id: String,
    pub from: Option<ClassId>,
    pub to: Option<ClassId>,
    pub from_multiplicity: String,
    pub to_multiplicity: String,
    pub is_generalization: bool,
    /// Name of the association class for many-to-many relationships.
    pub association: Option<String>,
}

impl Relationship {
    pub fn is_many_to_many(&self) -> bool {
        is_many(&self.from_multiplicity) && is_many(&self.to_multiplicity)
    }
}

/// True for multiplicity text meaning "many".
pub fn is_many(multiplicity: &str) -> bool {
    let lower = multiplicity.to_lowercase();
    lower.contains("star") || lower.contains('*')
}

/// Where a generalization was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneralizationSource {
    Explicit,
    Relationship,
}

/// A supertype/subtype pair.
#[derive(Debug, Clone)]
pub struct Generalization {
    pub rel_id: String,
    pub super_class: ClassId,
    pub sub_class: ClassId,
    pub source: GeneralizationSource,
}

/// Association class synthesized for a many-to-many relationship.
#[derive(Debug, Clone)]
pub struct AssociationClass {
    pub name: String,
    pub py_name: String,
    pub key_letters: String,
    pub rel_id: String,
    pub from: ClassId,
    pub to: ClassId,
    pub attributes: Vec<Attribute>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_class(id: &str, name: &str, kl: &str) -> Class {
        Class {
            id: id.to_string(),
            name: name.to_string(),
            key_letters: kl.to_string(),
            py_name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_by_any_key() {
        let model = Model {
            classes: vec![make_class("c1", "Pump", "PMP"), make_class("c2", "Tank", "TNK")],
            ..Default::default()
        };
        assert_eq!(model.resolve_class("pmp"), Some(ClassId(0)));
        assert_eq!(model.resolve_class("TANK"), Some(ClassId(1)));
        assert_eq!(model.resolve_class("C2"), Some(ClassId(1)));
        assert_eq!(model.resolve_class("Valve"), None);
        assert_eq!(model.resolve_class(""), None);
    }

    #[test]
    fn many_to_many_detection() {
        let rel = Relationship {
            rel_id: "R3".into(),
            from_multiplicity: "0..*".into(),
            to_multiplicity: "star".into(),
            ..Default::default()
        };
        assert!(rel.is_many_to_many());
        assert!(!is_many("1"));
    }

    #[test]
    fn event_lookup_prefers_owning_class() {
        let model = Model {
            classes: vec![make_class("c1", "A", "A"), make_class("c2", "B", "B")],
            events: vec![
                EventDef { name: "Go".into(), class: Some(ClassId(0)), parameters: vec![] },
                EventDef {
                    name: "go".into(),
                    class: Some(ClassId(1)),
                    parameters: vec![Parameter::new("n", OalType::Integer)],
                },
            ],
            ..Default::default()
        };
        assert_eq!(model.event("GO", Some(ClassId(1))).map(|e| e.parameters.len()), Some(1));
        assert_eq!(model.event("go", None).map(|e| e.class), Some(Some(ClassId(0))));
    }
}
