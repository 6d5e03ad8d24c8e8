//! Class definitions registered with a [`Runtime`](crate::Runtime).

use std::sync::Arc;

use serde_json::Value;

use crate::instance::Payload;
use crate::state_machine::{StateMachine, TransitionTable};

/// Initial state and shared transition table of a class.
#[derive(Debug, Clone)]
pub struct MachineDef {
    pub initial_state: String,
    pub table: Arc<TransitionTable>,
}

/// What the runtime needs to know to create instances of a class.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub key_letters: String,
    /// Attribute defaults copied into every new instance.
    pub attributes: Payload,
    pub machine: Option<MachineDef>,
    /// Association classes are stepped through by navigation.
    pub is_association: bool,
}

impl ClassDef {
    pub fn new(name: &str, key_letters: &str) -> Self {
        Self {
            name: name.to_string(),
            key_letters: key_letters.to_string(),
            attributes: Payload::new(),
            machine: None,
            is_association: false,
        }
    }

    pub fn attribute(mut self, name: &str, default: Value) -> Self {
        self.attributes.insert(name.to_string(), default);
        self
    }

    pub fn state_machine(mut self, initial_state: &str, table: TransitionTable) -> Self {
        self.machine = Some(MachineDef {
            initial_state: initial_state.to_string(),
            table: Arc::new(table),
        });
        self
    }

    pub fn association(mut self) -> Self {
        self.is_association = true;
        self
    }

    /// True when `reference` names this class by name or key letters,
    /// ignoring case.
    pub fn matches(&self, reference: &str) -> bool {
        self.name.eq_ignore_ascii_case(reference) || self.key_letters.eq_ignore_ascii_case(reference)
    }

    pub(crate) fn new_machine(&self) -> Option<StateMachine> {
        self.machine
            .as_ref()
            .map(|def| StateMachine::new(def.initial_state.clone(), Arc::clone(&def.table)))
    }
}
