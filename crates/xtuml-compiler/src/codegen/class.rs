//! Python module generation for a single model class.
//!
//! Each class becomes `models/<PyName>.py` holding one `InstanceBase`
//! subclass: attributes, operations, generalization helpers and, when the
//! class has one, its state machine table and action methods. External
//! entities become plain bridge classes bound to a runtime.

use std::collections::{BTreeMap, HashSet};

use crate::diagnostic::TranslationNote;
use crate::ir::{Class, ClassId, Model, Operation, Parameter, StateMachine, Transition};
use crate::oal::{translate_expression, ActionContext, ActionTranslator, ContextKind};

use super::py_types::{attribute_initializer, parameter_default, py_ident, py_string, to_py_type};
use super::GeneratedModule;

const BODY_INDENT: &str = "        ";

/// Banner placed below the path comment of every generated module.
pub const FILE_HEADER: &str = "# Generated by xtumlc. Do not edit.\n";

/// Generates the module for one class.
pub fn generate_class(model: &Model, id: ClassId, translator: &ActionTranslator<'_>) -> GeneratedModule {
    let class = model.class(id);
    if class.is_external {
        return generate_external(class, translator);
    }

    let mut module = GeneratedModule::default();
    let py_name = &class.py_name;
    let event_states = event_states(class.state_machine.as_ref());

    let code = &mut module.code;
    code.push_str(&format!("# models/{}.py\n{}", py_name, FILE_HEADER));
    code.push_str(
        r#"from __future__ import annotations

import uuid
from typing import Any, Dict, List, Optional

from runtime.base import InstanceBase
from runtime.services import EventInstance
"#,
    );
    if class.state_machine.is_some() {
        code.push_str("from runtime.state_machine import StateMachine\n");
    }

    code.push_str(&format!("\n\nclass {}(InstanceBase):\n", py_name));
    code.push_str(&format!(
        "    \"\"\"xtUML class {} ({}).\"\"\"\n\n",
        class.name, class.key_letters
    ));
    code.push_str(&class_constants(model, class));

    // Constructor
    code.push_str("\n    def __init__(self, rt, id: Optional[str] = None):\n");
    code.push_str("        super().__init__(rt, id)\n");
    for attribute in &class.attributes {
        code.push_str(&format!(
            "        self.set_attr({}, {})  # {}\n",
            py_string(&attribute.name),
            attribute_initializer(attribute),
            attribute.data_type
        ));
    }
    code.push_str(&format!(
        "        rt.store.create({}, self._id, self)\n",
        py_string(py_name)
    ));
    if class.state_machine.is_some() {
        code.push_str("        self._build_state_machine()\n");
    }

    code.push_str(&generalization_helpers(model, id));

    for op in &class.operations {
        let location = format!("{}.{}", class.name, op.name);
        let ctx = ActionContext {
            class: Some(&class.name),
            owner: "owner",
            context: ContextKind::Operation,
            base_indent: BODY_INDENT,
            event_states: &event_states,
        };
        code.push_str(&operation_header(op, "OP", &format!("{}.{}", py_name, op.name)));
        if !op.action.trim().is_empty() {
            let translation = translator.translate(&op.action, &ctx);
            code.push_str(&translation.code);
            module
                .notes
                .extend(translation.notes.into_iter().map(|n| n.under(&location)));
        }
    }

    if let Some(sm) = &class.state_machine {
        let (section, notes) = state_machine_section(class, sm, &event_states, translator);
        module.code.push_str(&section);
        module.notes.extend(notes);
    }

    module
}

/// Event name to the origin state of its first transition.
pub fn event_states(sm: Option<&StateMachine>) -> BTreeMap<String, String> {
    let mut states = BTreeMap::new();
    if let Some(sm) = sm {
        for transition in &sm.transitions {
            states
                .entry(transition.event.clone())
                .or_insert_with(|| transition.from.clone());
        }
    }
    states
}

fn class_constants(model: &Model, class: &Class) -> String {
    let mut code = String::new();
    code.push_str(&format!("    kl = {}\n", py_string(&class.key_letters)));
    code.push_str(&format!("    model_name = {}\n", py_string(&class.name)));
    code.push_str(&format!("    class_id = {}\n", py_string(&class.id)));
    if let Some(super_id) = class.super_class {
        code.push_str(&format!(
            "    supertype = {}\n",
            py_string(&model.class(super_id).py_name)
        ));
    }
    if !class.sub_classes.is_empty() {
        let names: Vec<String> = class
            .sub_classes
            .iter()
            .map(|id| py_string(&model.class(*id).py_name))
            .collect();
        let trailing = if names.len() == 1 { "," } else { "" };
        code.push_str(&format!("    subtypes = ({}{})\n", names.join(", "), trailing));
    }
    code
}

fn generalization_helpers(model: &Model, id: ClassId) -> String {
    let class = model.class(id);
    let mut code = String::new();

    if let Some(super_id) = class.super_class {
        let rel_id = model
            .generalizations
            .iter()
            .find(|g| g.super_class == super_id && g.sub_class == id)
            .map(|g| g.rel_id.as_str())
            .unwrap_or_default();
        let super_name = &model.class(super_id).py_name;
        code.push_str(&format!(
            "\n    def get_supertype(self) -> Optional[InstanceBase]:\n        \"\"\"The {} instance this is a subtype of, across {}.\"\"\"\n        return self.rt.links.select_one_related({}, self, {})\n",
            super_name,
            rel_id,
            py_string(rel_id),
            py_string(super_name)
        ));
    }

    if !class.sub_classes.is_empty() {
        let pairs: Vec<String> = model
            .generalizations
            .iter()
            .filter(|g| g.super_class == id)
            .map(|g| {
                format!(
                    "({}, {})",
                    py_string(&g.rel_id),
                    py_string(&model.class(g.sub_class).py_name)
                )
            })
            .collect();
        let trailing = if pairs.len() == 1 { "," } else { "" };
        code.push_str("\n    def get_subtype(self) -> Optional[InstanceBase]:\n");
        code.push_str("        \"\"\"The subtype instance currently related to this supertype.\"\"\"\n");
        code.push_str(&format!(
            "        for rel_id, subtype in ({}{}):\n",
            pairs.join(", "),
            trailing
        ));
        code.push_str("            found = self.rt.links.select_one_related(rel_id, self, subtype)\n");
        code.push_str("            if found is not None:\n");
        code.push_str("                return found\n");
        code.push_str("        return None\n");
    }

    code
}

/// `name: type = default` list for a Python signature, keyword-only
/// extras collected in `**kwargs`.
pub(super) fn render_parameters(params: &[Parameter]) -> String {
    params
        .iter()
        .map(|p| {
            format!(
                "{}: {} = {}",
                py_ident(&p.name),
                to_py_type(&p.data_type),
                parameter_default(&p.data_type)
            )
        })
        .chain(std::iter::once("**kwargs".to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lines copying named parameters into `kwargs`, where `param.x` reads them.
pub(super) fn bind_parameters(params: &[Parameter], indent: &str) -> String {
    params
        .iter()
        .map(|p| format!("{}kwargs[{}] = {}\n", indent, py_string(&p.name), py_ident(&p.name)))
        .collect()
}

fn operation_header(op: &Operation, tag: &str, label: &str) -> String {
    let mut code = String::new();
    code.push_str(&format!(
        "\n    def {}(self, {}):\n",
        py_ident(&op.name),
        render_parameters(&op.parameters)
    ));
    code.push_str(&format!("        \"\"\"{}\"\"\"\n", docstring_text(&op.signature)));
    code.push_str("        owner = self\n");
    code.push_str("        rt = self.rt\n");
    code.push_str("        payload = kwargs\n");
    code.push_str(&bind_parameters(&op.parameters, BODY_INDENT));
    code.push_str(&format!(
        "        rt.log({}, f\"{{self!r}} {}({{kwargs}})\")\n",
        py_string(tag),
        label.replace('{', "{{").replace('}', "}}").replace('"', "'")
    ));
    code
}

pub(super) fn docstring_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}

// ============================================================================
// State machine
// ============================================================================

/// One row of the generated transition table.
#[derive(Debug, Clone)]
struct TableRow<'m> {
    /// State the row is keyed under.
    state: String,
    transition: &'m Transition,
    /// Action method, absent when the transition has no action.
    method: Option<String>,
    /// Explicit state this row was copied from.
    alias_of: Option<String>,
}

/// Action method name for a `(state, event)` pair.
fn action_method_name(state: &str, event: &str) -> String {
    let sanitize = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    };
    format!("_sm_action_{}_{}", sanitize(state), sanitize(event))
}

/// Table rows: explicit transitions first, then `Base_Variant` rows copied
/// to a declared `Base` state that has no explicit row for the event.
fn table_rows(sm: &StateMachine) -> Vec<TableRow<'_>> {
    let mut rows: Vec<TableRow<'_>> = Vec::new();
    let mut keys: HashSet<(String, String)> = HashSet::new();
    let mut methods: HashSet<String> = HashSet::new();

    for transition in &sm.transitions {
        let key = (transition.from.clone(), transition.event.clone());
        if !keys.insert(key) {
            continue;
        }
        let method = (!transition.action.trim().is_empty()).then(|| {
            let base = action_method_name(&transition.from, &transition.event);
            let mut method = base.clone();
            let mut n = 2;
            while !methods.insert(method.clone()) {
                method = format!("{}_{}", base, n);
                n += 1;
            }
            method
        });
        rows.push(TableRow {
            state: transition.from.clone(),
            transition,
            method,
            alias_of: None,
        });
    }

    let explicit = rows.clone();
    for row in &explicit {
        let Some((base, _)) = row.state.split_once('_') else {
            continue;
        };
        if base.is_empty() || !sm.has_state(base) {
            continue;
        }
        if keys.insert((base.to_string(), row.transition.event.clone())) {
            rows.push(TableRow {
                state: base.to_string(),
                alias_of: Some(row.state.clone()),
                ..row.clone()
            });
        }
    }

    rows
}

fn state_machine_section(
    class: &Class,
    sm: &StateMachine,
    event_states: &BTreeMap<String, String>,
    translator: &ActionTranslator<'_>,
) -> (String, Vec<TranslationNote>) {
    let mut code = String::new();
    let mut notes = Vec::new();
    let rows = table_rows(sm);

    code.push_str("\n    # State machine\n");

    for row in rows.iter().filter(|r| r.alias_of.is_none()) {
        let Some(method) = &row.method else {
            continue;
        };
        let transition = row.transition;

        code.push_str(&format!(
            "\n    def {}(self, owner, payload: Dict[str, Any]) -> None:\n",
            method
        ));
        code.push_str(&format!(
            "        \"\"\"{} --{}--> {}\"\"\"\n",
            docstring_text(&transition.from),
            docstring_text(&transition.event),
            docstring_text(&transition.to)
        ));
        if !transition.event_parameters.is_empty() {
            let params: Vec<String> = transition
                .event_parameters
                .iter()
                .map(|p| format!("{}: {}", p.name, p.data_type))
                .collect();
            code.push_str(&format!("        # Event parameters: {}\n", params.join(", ")));
        }
        code.push_str("        rt = owner.rt\n");
        code.push_str("        kwargs = payload\n");

        let ctx = ActionContext {
            class: Some(&class.name),
            owner: "owner",
            context: ContextKind::StateAction,
            base_indent: BODY_INDENT,
            event_states,
        };
        let translation = translator.translate(&transition.action, &ctx);
        code.push_str(&translation.code);
        let location = format!("{}[{}/{}]", class.name, transition.from, transition.event);
        notes.extend(translation.notes.into_iter().map(|n| n.under(&location)));
    }

    code.push_str("\n    def _build_sm_table(self) -> Dict[str, Dict[str, Any]]:\n");
    code.push_str("        table: Dict[str, Dict[str, Any]] = {}\n");
    for row in &rows {
        if let Some(origin) = &row.alias_of {
            code.push_str(&format!("        # {} inherits from {}\n", row.state, origin));
        }
        let guard = match &row.transition.guard {
            Some(expr) => format!(
                "lambda owner, payload: {}",
                translate_expression(expr, ContextKind::StateAction)
            ),
            None => "None".to_string(),
        };
        let action = match &row.method {
            Some(method) => format!("self.{}", method),
            None => "None".to_string(),
        };
        code.push_str(&format!(
            "        table.setdefault({}, {{}})[{}] = ({}, {}, {})\n",
            py_string(&row.state),
            py_string(&row.transition.event),
            guard,
            action,
            py_string(&row.transition.to)
        ));
    }
    code.push_str("        return table\n");

    code.push_str("\n    def _build_state_machine(self) -> None:\n");
    code.push_str(&format!(
        "        initial_state = self.get_attr(\"currentState\") or {}\n",
        py_string(&sm.initial_state)
    ));
    code.push_str("        self.sm = StateMachine(self, initial_state, self._build_sm_table())\n");

    code.push_str(
        r#"
    def dispatch_event(self, event_name: str, **payload: Any) -> bool:
        """Dispatches an event to this instance's state machine."""
        return self.sm.dispatch(event_name, payload)

    def get_current_state(self) -> str:
        return self.sm.get_current_state()
"#,
    );

    (code, notes)
}

// ============================================================================
// External entities
// ============================================================================

fn generate_external(class: &Class, translator: &ActionTranslator<'_>) -> GeneratedModule {
    let mut module = GeneratedModule::default();
    let py_name = &class.py_name;
    let no_states = BTreeMap::new();

    let code = &mut module.code;
    code.push_str(&format!("# models/{}.py\n{}", py_name, FILE_HEADER));
    code.push_str(
        r#"from __future__ import annotations

import uuid
from typing import Any, Dict, List, Optional

from runtime.services import EventInstance
"#,
    );
    code.push_str(&format!("\n\nclass {}:\n", py_name));
    code.push_str(&format!(
        "    \"\"\"External entity {} ({}).\"\"\"\n\n",
        class.name, class.key_letters
    ));
    code.push_str(&format!("    kl = {}\n", py_string(&class.key_letters)));
    code.push_str(&format!("    model_name = {}\n", py_string(&class.name)));
    code.push_str(&format!("    class_id = {}\n", py_string(&class.id)));
    code.push_str("    is_external = True\n");
    code.push_str("\n    def __init__(self, rt):\n        self.rt = rt\n");

    for op in &class.operations {
        let label = format!("{}::{}", class.key_letters, op.name);
        code.push_str(&operation_header(op, "BRIDGE", &label));
        if op.action.trim().is_empty() {
            continue;
        }
        let ctx = ActionContext {
            class: Some(&class.name),
            owner: "owner",
            context: ContextKind::Operation,
            base_indent: BODY_INDENT,
            event_states: &no_states,
        };
        let translation = translator.translate(&op.action, &ctx);
        code.push_str(&translation.code);
        let location = format!("{}.{}", class.name, op.name);
        module
            .notes
            .extend(translation.notes.into_iter().map(|n| n.under(&location)));
    }

    module
}
