//! Builds the canonical [`Model`] from a JSON model document.
//!
//! Normalization never fails. It is meant to run on a validated document,
//! but anything missing or malformed simply yields empty collections or is
//! skipped, so it also works as a best-effort pass over raw input.

use std::collections::{BTreeSet, HashSet};

use serde_json::Value;

use crate::codegen::py_types::py_ident;
use crate::ir::{
    AssociationClass, Attribute, Class, ClassId, EventDef, Function, Generalization,
    GeneralizationSource, Model, OalType, Operation, Relationship, State, StateMachine,
    Transition,
};

use super::document::{self as doc, text};

/// Normalizes a model document.
pub fn normalize(document: &Value) -> Model {
    let mut model = Model {
        name: doc::model_name(document),
        ..Default::default()
    };

    let class_entries: Vec<&Value> = doc::classes(document)
        .iter()
        .filter(|c| c.is_object())
        .collect();

    // Identity first, so every later reference can resolve against it.
    for entry in &class_entries {
        let name = text(entry, &["class_name"]).unwrap_or_default();
        model.classes.push(Class {
            id: text(entry, &["class_id"]).unwrap_or_else(|| name.clone()),
            key_letters: text(entry, &["KL"]).unwrap_or_else(|| name.clone()),
            name,
            is_external: doc::flag(entry, "is_external"),
            ..Default::default()
        });
    }

    model.events = doc::array(document, "events")
        .iter()
        .filter(|e| e.is_object())
        .filter_map(|entry| {
            Some(EventDef {
                name: text(entry, &["event_name"])?,
                class: text(entry, &["class_id"]).and_then(|c| model.resolve_class(&c)),
                parameters: entry.get("parameters").map(doc::parameters).unwrap_or_default(),
            })
        })
        .collect();

    for (index, entry) in class_entries.iter().enumerate() {
        let id = ClassId(index);
        let attributes = doc::array(entry, "attributes")
            .iter()
            .filter(|a| a.is_object())
            .map(|a| attribute(&model, a))
            .collect();
        let operations = doc::array(entry, "operations")
            .iter()
            .filter_map(operation)
            .collect();
        let state_machine = state_machine(&model, id, entry);

        let class = &mut model.classes[index];
        class.attributes = attributes;
        class.operations = operations;
        class.state_machine = state_machine;
    }

    model.functions = doc::array(document, "functions")
        .iter()
        .filter_map(|entry| {
            let op = operation(entry)?;
            Some(Function {
                name: op.name,
                signature: op.signature,
                parameters: op.parameters,
                action: op.action,
            })
        })
        .collect();

    let mut generalizations = GeneralizationBuilder::default();
    for entry in doc::array(document, "generalizations") {
        let super_ref = text(entry, doc::SUPER_KEYS);
        let sub_ref = text(entry, doc::SUB_KEYS);
        let rel_id = text(entry, &["rel_id", "relId", "id"]);
        generalizations.add(
            &model,
            super_ref,
            sub_ref,
            rel_id,
            GeneralizationSource::Explicit,
        );
    }

    for entry in doc::array(document, "relationships") {
        if !entry.is_object() {
            continue;
        }
        let rel_id = text(entry, doc::REL_ID_KEYS).unwrap_or_default();

        if doc::is_generalization_relationship(entry) {
            let (super_ref, sub_ref) = doc::relationship_generalization_ends(entry);
            generalizations.add(
                &model,
                super_ref,
                sub_ref,
                Some(rel_id.clone()).filter(|r| !r.is_empty()),
                GeneralizationSource::Relationship,
            );
            let relationship = Relationship {
                rel_id,
                from: text(entry, doc::FROM_KEYS).and_then(|r| model.resolve_class(&r)),
                to: text(entry, doc::TO_KEYS).and_then(|r| model.resolve_class(&r)),
                is_generalization: true,
                ..Default::default()
            };
            model.relationships.push(relationship);
            continue;
        }

        let mut relationship = Relationship {
            from: text(entry, doc::FROM_KEYS).and_then(|r| model.resolve_class(&r)),
            to: text(entry, doc::TO_KEYS).and_then(|r| model.resolve_class(&r)),
            from_multiplicity: text(entry, doc::FROM_MULTIPLICITY_KEYS).unwrap_or_default(),
            to_multiplicity: text(entry, doc::TO_MULTIPLICITY_KEYS).unwrap_or_default(),
            rel_id,
            ..Default::default()
        };

        if relationship.is_many_to_many() {
            let explicit = text(entry, doc::ASSOCIATION_KEYS).and_then(|r| model.resolve_class(&r));
            match (explicit, relationship.from, relationship.to) {
                (Some(existing), _, _) => {
                    relationship.association = Some(model.class(existing).name.clone());
                }
                (None, Some(from), Some(to)) => {
                    let name = format!(
                        "{}_{}_{}",
                        model.class(from).name,
                        model.class(to).name,
                        relationship.rel_id
                    );
                    let attributes = doc::array(entry, "association_attributes")
                        .iter()
                        .filter(|a| a.is_object())
                        .map(|a| attribute(&model, a))
                        .collect();
                    relationship.association = Some(name.clone());
                    model.association_classes.push(AssociationClass {
                        py_name: String::new(),
                        key_letters: name.clone(),
                        name,
                        rel_id: relationship.rel_id.clone(),
                        from,
                        to,
                        attributes,
                    });
                }
                _ => {}
            }
        }

        model.relationships.push(relationship);
    }

    generalizations.wire(&mut model);
    assign_py_names(&mut model);

    tracing::debug!(
        model = %model.name,
        classes = model.classes.len(),
        relationships = model.relationships.len(),
        generalizations = model.generalizations.len(),
        association_classes = model.association_classes.len(),
        "normalized model"
    );

    model
}

fn attribute(model: &Model, entry: &Value) -> Attribute {
    Attribute {
        name: text(entry, &["attribute_name"]).unwrap_or_default(),
        data_type: text(entry, &["data_type"])
            .map(|t| OalType::parse(&t))
            .unwrap_or_default(),
        default_value: entry
            .get("default_value")
            .filter(|v| !v.is_null())
            .cloned(),
        related_class: text(entry, &["related_class_id", "related_class_name"])
            .and_then(|r| model.resolve_class(&r)),
        relationship_id: text(entry, &["relationship_id"]),
    }
}

/// An operation from a signature string or an object entry.
fn operation(entry: &Value) -> Option<Operation> {
    let signature = doc::callable_signature(entry)?;
    let (name, _) = doc::split_signature(&signature);
    Some(Operation {
        name,
        parameters: doc::callable_parameters(entry),
        action: doc::action_text(entry.get("action")),
        signature,
    })
}

fn state_machine(model: &Model, owner: ClassId, entry: &Value) -> Option<StateMachine> {
    let rows: Vec<&Value> = doc::array(entry, "states")
        .iter()
        .filter(|s| s.is_object())
        .collect();
    if rows.is_empty() {
        return None;
    }

    let mut machine = StateMachine::default();
    let mut seen = HashSet::new();

    for row in &rows {
        let Some(state_name) = text(row, &["state_name"]) else {
            continue;
        };
        if seen.insert(state_name.clone()) {
            machine.states.push(State {
                id: text(row, &["state_id"]).unwrap_or_else(|| state_name.clone()),
                name: state_name.clone(),
            });
        }

        let to = text(row, &["next_state"]).unwrap_or_else(|| state_name.clone());
        let action = doc::action_text(row.get("action"));

        for signature in doc::state_events(row) {
            let event = doc::event_name(&signature);
            if event.is_empty() {
                continue;
            }
            let transition = Transition {
                from: state_name.clone(),
                event_parameters: model
                    .event(&event, Some(owner))
                    .map(|e| e.parameters.clone())
                    .unwrap_or_default(),
                event,
                event_signature: signature,
                guard: None,
                action: action.clone(),
                to: to.clone(),
            };
            let duplicate = machine.transitions.iter().any(|t| {
                t.from == transition.from
                    && t.event == transition.event
                    && t.to == transition.to
                    && t.action == transition.action
            });
            if !duplicate {
                machine.transitions.push(transition);
            }
        }
    }

    let persisted = doc::array(entry, "attributes")
        .iter()
        .find(|a| text(a, &["attribute_name"]).as_deref() == Some("currentState"))
        .and_then(|a| a.get("default_value"))
        .and_then(doc::scalar_text);
    machine.initial_state = persisted
        .or_else(|| machine.states.first().map(|s| s.name.clone()))
        .unwrap_or_default();

    Some(machine)
}

/// Collects generalizations, deduplicated by `(super, sub)`.
#[derive(Default)]
struct GeneralizationBuilder {
    seen: BTreeSet<(ClassId, ClassId)>,
    entries: Vec<Generalization>,
}

impl GeneralizationBuilder {
    fn add(
        &mut self,
        model: &Model,
        super_ref: Option<String>,
        sub_ref: Option<String>,
        rel_id: Option<String>,
        source: GeneralizationSource,
    ) {
        let (Some(super_ref), Some(sub_ref)) = (super_ref, sub_ref) else {
            return;
        };
        let (Some(super_class), Some(sub_class)) =
            (model.resolve_class(&super_ref), model.resolve_class(&sub_ref))
        else {
            return;
        };
        if super_class == sub_class || !self.seen.insert((super_class, sub_class)) {
            return;
        }
        let rel_id = rel_id.unwrap_or_else(|| {
            format!(
                "GEN_{}_{}",
                model.class(super_class).id,
                model.class(sub_class).id
            )
        });
        self.entries.push(Generalization {
            rel_id,
            super_class,
            sub_class,
            source,
        });
    }

    /// Links both directions. A subtype keeps its first supertype; a second
    /// one is a validation error and is ignored here.
    fn wire(self, model: &mut Model) {
        for generalization in &self.entries {
            let sub = &mut model.classes[generalization.sub_class.0];
            if sub.super_class.is_some() {
                continue;
            }
            sub.super_class = Some(generalization.super_class);
            let sup = &mut model.classes[generalization.super_class.0];
            if !sup.sub_classes.contains(&generalization.sub_class) {
                sup.sub_classes.push(generalization.sub_class);
            }
        }
        model.generalizations = self.entries;
    }
}

/// Gives every class and association class a distinct Python name.
fn assign_py_names(model: &mut Model) {
    let mut taken: HashSet<String> = HashSet::new();
    let mut unique = |name: &str| {
        let base = py_ident(name);
        let mut candidate = base.clone();
        let mut n = 2;
        while !taken.insert(candidate.to_lowercase()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        candidate
    };

    for class in &mut model.classes {
        class.py_name = unique(&class.name);
    }
    for assoc in &mut model.association_classes {
        assoc.py_name = unique(&assoc.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_document() -> Value {
        json!({
            "sub_name": "vending",
            "model": [
                {
                    "class_id": "C1", "class_name": "Machine", "KL": "VM",
                    "attributes": [
                        {"attribute_name": "balance", "data_type": "integer", "default_value": 0},
                        {"attribute_name": "currentState", "data_type": "string", "default_value": "Idle"}
                    ],
                    "operations": [
                        "refund(amount: integer)",
                        {"signature": "reset()", "action": ["self.balance = 0;"]}
                    ],
                    "states": [
                        {"state_id": "S1", "state_name": "Ready", "state_event": ["Coin[amount: integer]", "Coin"], "next_state": "Idle"},
                        {"state_id": "S2", "state_name": "Idle", "state_event": "Coin", "next_state": "Ready", "action": "x = 1;"},
                        {"state_id": "S3", "state_name": "Idle", "state_event": "Coin", "next_state": "Ready", "action": "x = 1;"}
                    ]
                },
                {"class_id": "C2", "class_name": "Product", "KL": "PRD"},
                {"class_id": "C3", "class_name": "Snack", "KL": "SNK"},
                {"class_id": "C4", "class_name": "Drink", "KL": "DRK"},
                {"class_id": "C5", "class_name": "Logger", "KL": "LOG", "is_external": true}
            ],
            "relationships": [
                {"rel_id": "R1", "from_class": "VM", "to_class": "PRD",
                 "from_class_multiplicity": "0_star", "to_class_multiplicity": "1_star",
                 "association_attributes": [{"attribute_name": "slot", "data_type": "integer"}]},
                {"rel_id": "R2", "type": "generalization", "from_class": "PRD", "to_class": "SNK"}
            ],
            "generalizations": [
                {"super": "Product", "sub": "Drink", "rel_id": "R2"},
                {"parent": "PRD", "child": "Snack"}
            ],
            "events": [
                {"event_name": "Coin", "class_id": "C1", "parameters": ["amount: integer"]}
            ],
            "functions": [
                {"name": "restock", "parameters": "count: integer", "action": "x = count;"}
            ]
        })
    }

    #[test]
    fn test_normalizes_classes() {
        let model = normalize(&make_document());
        assert_eq!(model.name, "vending");
        assert_eq!(model.classes.len(), 5);

        let machine = &model.classes[0];
        assert_eq!(machine.key_letters, "VM");
        assert_eq!(machine.attributes[0].data_type, OalType::Integer);
        assert_eq!(machine.operations[0].name, "refund");
        assert_eq!(machine.operations[0].parameters[0].data_type, OalType::Integer);
        assert_eq!(machine.operations[1].action, "self.balance = 0;");
        assert!(model.classes[4].is_external);
    }

    #[test]
    fn test_builds_state_machine() {
        let model = normalize(&make_document());
        let sm = model.classes[0].state_machine.as_ref().unwrap();

        assert_eq!(sm.initial_state, "Idle");
        assert_eq!(sm.states.len(), 2);
        // Ready/Coin twice plus Idle/Coin collapsed from two identical rows.
        assert_eq!(sm.transitions.len(), 2);
        assert_eq!(sm.transitions[0].event, "Coin");
        assert_eq!(sm.transitions[0].event_signature, "Coin[amount: integer]");
        assert_eq!(sm.transitions[0].event_parameters.len(), 1);
        assert_eq!(sm.transitions[1].action, "x = 1;");
        assert!(model.classes[1].state_machine.is_none());
    }

    #[test]
    fn test_initial_state_defaults_to_first_state() {
        let doc = json!({"classes": [{"class_id": 1, "class_name": "A", "KL": "A",
            "states": [{"state_name": "Start"}, {"state_name": "Stop"}]}]});
        let model = normalize(&doc);
        assert_eq!(model.name, "xtuml_model");
        assert_eq!(model.classes[0].id, "1");
        assert_eq!(model.classes[0].state_machine.as_ref().unwrap().initial_state, "Start");
    }

    #[test]
    fn test_resolves_generalizations() {
        let model = normalize(&make_document());
        // Drink (explicit), Snack (explicit block) and Snack again from R2 deduplicated.
        assert_eq!(model.generalizations.len(), 2);
        assert_eq!(model.generalizations[0].rel_id, "R2");
        assert_eq!(model.generalizations[1].rel_id, "GEN_C2_C3");
        assert_eq!(model.classes[3].super_class, Some(ClassId(1)));
        assert_eq!(model.classes[2].super_class, Some(ClassId(1)));
        assert_eq!(model.classes[1].sub_classes, vec![ClassId(3), ClassId(2)]);
        assert!(model.relationship("R2").unwrap().is_generalization);
    }

    #[test]
    fn test_synthesizes_association_class() {
        let model = normalize(&make_document());
        assert_eq!(model.association_classes.len(), 1);
        let assoc = &model.association_classes[0];
        assert_eq!(assoc.name, "Machine_Product_R1");
        assert_eq!(assoc.py_name, "Machine_Product_R1");
        assert_eq!(assoc.rel_id, "R1");
        assert_eq!(assoc.attributes[0].name, "slot");
        assert_eq!(
            model.relationship("R1").unwrap().association.as_deref(),
            Some("Machine_Product_R1")
        );
    }

    #[test]
    fn test_explicit_association_class_is_not_synthesized() {
        let doc = json!({"classes": [
            {"class_id": 1, "class_name": "A", "KL": "A"},
            {"class_id": 2, "class_name": "B", "KL": "B"},
            {"class_id": 3, "class_name": "Link", "KL": "L"}
        ], "relationships": [
            {"rel_id": "R9", "from_class": "A", "to_class": "B",
             "from_class_multiplicity": "*", "to_class_multiplicity": "*", "assoc_class": "L"}
        ]});
        let model = normalize(&doc);
        assert!(model.association_classes.is_empty());
        assert_eq!(model.relationships[0].association.as_deref(), Some("Link"));
    }

    #[test]
    fn test_functions_and_py_names() {
        let doc = json!({"classes": [
            {"class_id": 1, "class_name": "Order Item", "KL": "OI"},
            {"class_id": 2, "class_name": "Order-Item", "KL": "OI2"}
        ], "functions": ["ping(n: integer)"]});
        let model = normalize(&doc);
        assert_eq!(model.classes[0].py_name, "Order_Item");
        assert_eq!(model.classes[1].py_name, "Order_Item_2");
        assert_eq!(model.functions[0].name, "ping");
        assert_eq!(model.functions[0].parameters[0].name, "n");
    }

    #[test]
    fn test_tolerates_garbage() {
        let model = normalize(&json!({"classes": "nope", "relationships": [1, null]}));
        assert!(model.classes.is_empty());
        assert!(model.relationships.is_empty());
        let model = normalize(&json!(42));
        assert!(model.classes.is_empty());
    }
}
