//! Model instances and their attribute bags.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::state_machine::StateMachine;

/// Attribute values and event payloads.
pub type Payload = BTreeMap<String, Value>;

/// Store-assigned instance identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live instance of a model class.
#[derive(Debug)]
pub struct Instance {
    id: InstanceId,
    class: String,
    key_letters: String,
    attrs: Mutex<Payload>,
    machine: Option<StateMachine>,
}

impl Instance {
    pub(crate) fn new(
        id: InstanceId,
        class: &str,
        key_letters: &str,
        attrs: Payload,
        machine: Option<StateMachine>,
    ) -> Arc<Self> {
        let instance = Arc::new(Self {
            id,
            class: class.to_string(),
            key_letters: key_letters.to_string(),
            attrs: Mutex::new(attrs),
            machine,
        });
        if let Some(sm) = &instance.machine {
            instance.set_attr("currentState", Value::from(sm.current_state()));
        }
        instance
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Name of the class this instance belongs to.
    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub fn key_letters(&self) -> &str {
        &self.key_letters
    }

    pub fn get_attr(&self, name: &str) -> Option<Value> {
        self.attrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn set_attr(&self, name: &str, value: Value) {
        self.attrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value);
    }

    /// Snapshot of every attribute.
    pub fn attributes(&self) -> Payload {
        self.attrs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn state_machine(&self) -> Option<&StateMachine> {
        self.machine.as_ref()
    }

    /// Current state, if the class has a state machine.
    pub fn current_state(&self) -> Option<String> {
        self.machine.as_ref().map(StateMachine::current_state)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.key_letters, self.id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_bag() {
        let instance = Instance::new(InstanceId(7), "Product", "PRD", Payload::new(), None);
        assert_eq!(instance.get_attr("stock"), None);
        instance.set_attr("stock", json!(3));
        assert_eq!(instance.get_attr("stock"), Some(json!(3)));
        assert_eq!(instance.to_string(), "[PRD:7]");
        assert_eq!(instance.current_state(), None);
    }
}
