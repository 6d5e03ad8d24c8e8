//! Project-level files: the `models` package index, `functions.py` and
//! the `app.py` entry point.

use std::collections::HashSet;

use crate::ir::{Class, Model};
use crate::oal::{ActionContext, ActionTranslator, ContextKind};

use super::class::{bind_parameters, docstring_text, render_parameters, FILE_HEADER};
use super::py_types::{default_literal, py_ident, py_string};
use super::GeneratedModule;

const FUNCTION_INDENT: &str = "    ";

/// Names `models/__init__.py` defines itself; key letter aliases may not
/// shadow them.
const RESERVED_EXPORTS: &[&str] = &["CLASSES", "EXTERNAL_ENTITIES", "register_all"];

/// Generates `models/__init__.py`.
pub fn generate_models_index(model: &Model) -> String {
    let mut code = String::new();
    code.push_str(&format!("# models/__init__.py\n{}", FILE_HEADER));
    code.push_str(&format!("\"\"\"Classes of the {} model.\"\"\"\n\n", docstring_text(&model.name)));

    let mut exports: Vec<String> = Vec::new();
    let mut taken: HashSet<String> = RESERVED_EXPORTS.iter().map(|s| s.to_string()).collect();

    for class in &model.classes {
        code.push_str(&format!("from models.{0} import {0}\n", class.py_name));
        exports.push(class.py_name.clone());
        taken.insert(class.py_name.clone());
    }
    for assoc in &model.association_classes {
        code.push_str(&format!("from models.{0} import {0}\n", assoc.py_name));
        exports.push(assoc.py_name.clone());
        taken.insert(assoc.py_name.clone());
    }

    let mut aliases = String::new();
    for class in &model.classes {
        let kl = &class.key_letters;
        if py_ident(kl) == *kl && taken.insert(kl.clone()) {
            aliases.push_str(&format!("{} = {}\n", kl, class.py_name));
            exports.push(kl.clone());
        }
    }
    if !aliases.is_empty() {
        code.push_str("\n# Key letter aliases\n");
        code.push_str(&aliases);
    }

    let instance_classes: Vec<&str> = model
        .classes
        .iter()
        .filter(|c| !c.is_external)
        .map(|c| c.py_name.as_str())
        .chain(model.association_classes.iter().map(|a| a.py_name.as_str()))
        .collect();
    let externals: Vec<&str> = model
        .classes
        .iter()
        .filter(|c| c.is_external)
        .map(|c| c.py_name.as_str())
        .collect();

    code.push_str(&format!("\nCLASSES = [{}]\n", instance_classes.join(", ")));
    code.push_str(&format!("EXTERNAL_ENTITIES = [{}]\n", externals.join(", ")));

    exports.extend(RESERVED_EXPORTS.iter().map(|s| s.to_string()));
    let quoted: Vec<String> = exports.iter().map(|e| format!("    {},", py_string(e))).collect();
    code.push_str(&format!("\n__all__ = [\n{}\n]\n", quoted.join("\n")));

    code.push_str(
        r#"

def register_all(rt) -> None:
    """Registers every class and external entity with a runtime."""
    for cls in CLASSES:
        rt.register_class(cls)
    for entity in EXTERNAL_ENTITIES:
        rt.register_bridge(entity.kl, entity(rt))
"#,
    );

    code
}

/// Generates `functions.py`.
pub fn generate_functions(model: &Model, translator: &ActionTranslator<'_>) -> GeneratedModule {
    let mut module = GeneratedModule::default();
    let no_states = Default::default();

    let code = &mut module.code;
    code.push_str(&format!("# functions.py\n{}", FILE_HEADER));
    code.push_str(&format!("\"\"\"Domain functions of the {} model.\"\"\"\n", docstring_text(&model.name)));
    code.push_str(
        r#"
from __future__ import annotations

import uuid
from typing import Any, Dict, List, Optional

from runtime.services import EventInstance
"#,
    );

    let mut used: HashSet<String> = HashSet::new();
    let mut table: Vec<(String, String)> = Vec::new();

    for function in &model.functions {
        let base = py_ident(&function.name);
        let mut py_name = base.clone();
        let mut n = 2;
        while !used.insert(py_name.clone()) {
            py_name = format!("{}_{}", base, n);
            n += 1;
        }

        let signature = if function.signature.is_empty() {
            &function.name
        } else {
            &function.signature
        };
        code.push_str(&format!(
            "\n\ndef {}(rt, {}):\n",
            py_name,
            render_parameters(&function.parameters)
        ));
        code.push_str(&format!("    \"\"\"{}\"\"\"\n", docstring_text(signature)));
        code.push_str("    owner = None\n");
        code.push_str("    payload = kwargs\n");
        code.push_str(&bind_parameters(&function.parameters, FUNCTION_INDENT));
        code.push_str(&format!(
            "    rt.log(\"FUNCTION\", f\"{}({{kwargs}})\")\n",
            function.name.replace('{', "{{").replace('}', "}}").replace('"', "'")
        ));

        if !function.action.trim().is_empty() {
            let ctx = ActionContext {
                class: None,
                owner: "owner",
                context: ContextKind::Function,
                base_indent: FUNCTION_INDENT,
                event_states: &no_states,
            };
            let translation = translator.translate(&function.action, &ctx);
            code.push_str(&translation.code);
            let location = format!("functions.{}", function.name);
            module
                .notes
                .extend(translation.notes.into_iter().map(|n| n.under(&location)));
        }

        table.push((function.name.clone(), py_name));
    }

    let entries: Vec<String> = table
        .iter()
        .map(|(name, py_name)| format!("    {}: {},", py_string(name), py_name))
        .collect();
    module.code.push_str(&format!("\n\nFUNCTIONS = {{\n{}\n}}\n", entries.join("\n")));
    module.code.push_str(
        r#"

def register_all(rt) -> None:
    """Registers every domain function with a runtime."""
    for name, fn in FUNCTIONS.items():
        rt.register_function(name, fn)
"#,
    );

    module
}

/// The class `app.py` drives: the first instance class with a state
/// machine, else the first instance class.
fn main_class(model: &Model) -> Option<&Class> {
    let mut instance_classes = model.classes.iter().filter(|c| !c.is_external);
    instance_classes
        .clone()
        .find(|c| c.state_machine.is_some())
        .or_else(|| instance_classes.next())
}

fn demo_key(class: &Class) -> String {
    class.py_name.to_lowercase()
}

/// Generates the `app.py` entry point.
pub fn generate_app(model: &Model) -> String {
    let mut code = String::new();
    code.push_str(&format!("#!/usr/bin/env python3\n# app.py\n{}", FILE_HEADER));
    code.push_str(&format!("\"\"\"Entry point for the {} model.\"\"\"\n", docstring_text(&model.name)));
    code.push_str(
        r#"
from __future__ import annotations

from typing import Any, Dict, Tuple

import models
"#,
    );
    if model.has_functions() {
        code.push_str("import functions\n");
    }
    code.push_str("from runtime import Runtime\n");
    code.push_str(&format!("\nMODEL_NAME = {}\n", py_string(&model.name)));

    code.push_str("\n\ndef build_runtime(verbose: bool = True) -> Runtime:\n");
    code.push_str("    rt = Runtime(MODEL_NAME, verbose=verbose)\n");
    code.push_str("    models.register_all(rt)\n");
    if model.has_functions() {
        code.push_str("    functions.register_all(rt)\n");
    }
    code.push_str("    return rt\n");

    code.push_str("\n\ndef setup_demo_data(rt: Runtime) -> Dict[str, Any]:\n");
    code.push_str("    \"\"\"Creates one instance of every class.\"\"\"\n");
    code.push_str("    instances: Dict[str, Any] = {}\n");
    for class in model.classes.iter().filter(|c| !c.is_external) {
        let key = demo_key(class);
        code.push_str(&format!(
            "    instances[{}] = rt.create({}, id={})\n",
            py_string(&key),
            py_string(&class.py_name),
            py_string(&format!("{}_1", key))
        ));
    }
    code.push_str("    return instances\n");

    code.push_str(
        r#"

def run() -> Tuple[Runtime, Dict[str, Any]]:
    rt = build_runtime()
    print("=" * 60)
    print(f"{MODEL_NAME} - system start")
    print("=" * 60)
    instances = setup_demo_data(rt)
"#,
    );
    if let Some(class) = main_class(model) {
        code.push_str(&format!(
            "    main_instance = instances.get({})\n",
            py_string(&demo_key(class))
        ));
        code.push_str("    if main_instance is not None and main_instance.sm is not None:\n");
        code.push_str("        print(f\"Current state: {main_instance.sm.get_current_state()}\")\n");
        if let Some(sm) = &class.state_machine {
            let first = sm
                .transitions
                .iter()
                .find(|t| t.from == sm.initial_state)
                .or_else(|| sm.transitions.first());
            if let Some(transition) = first {
                let args: Vec<String> = std::iter::once(py_string(&transition.event))
                    .chain(transition.event_parameters.iter().map(|p| {
                        format!("{}={}", py_ident(&p.name), default_literal(&p.data_type))
                    }))
                    .collect();
                code.push_str(&format!(
                    "        # main_instance.dispatch_event({})\n",
                    args.join(", ")
                ));
            }
        }
    }
    code.push_str("    return rt, instances\n");

    code.push_str(
        r#"

if __name__ == "__main__":
    rt, instances = run()
    print("Available instances:", list(instances.keys()))
"#,
    );

    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, OalType, Parameter, StateMachine, Transition};
    use crate::oal::SymbolTable;

    fn make_class(name: &str, kl: &str) -> Class {
        Class {
            id: name.to_string(),
            name: name.to_string(),
            key_letters: kl.to_string(),
            py_name: name.to_string(),
            ..Default::default()
        }
    }

    fn make_test_model() -> Model {
        let mut machine = make_class("Machine", "VM");
        machine.state_machine = Some(StateMachine {
            initial_state: "Idle".into(),
            transitions: vec![Transition {
                from: "Idle".into(),
                event: "Coin".into(),
                to: "Ready".into(),
                event_parameters: vec![Parameter::new("amount", OalType::Integer)],
                ..Default::default()
            }],
            ..Default::default()
        });
        let mut logger = make_class("Logger", "LOG");
        logger.is_external = true;
        Model {
            name: "vending".into(),
            classes: vec![make_class("Product", "Product"), machine, logger, make_class("Slot", "class")],
            functions: vec![Function {
                name: "restock".into(),
                signature: "restock(count: integer)".into(),
                parameters: vec![Parameter::new("count", OalType::Integer)],
                action: "select many ps from instances of Product;".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_models_index() {
        let code = generate_models_index(&make_test_model());
        assert!(code.contains("from models.Machine import Machine\n"));
        assert!(code.contains("VM = Machine\n"));
        assert!(code.contains("LOG = Logger\n"));
        // same as the class name, or not an identifier
        assert!(!code.contains("Product = Product"));
        assert!(!code.contains("class = Slot"));
        assert!(code.contains("CLASSES = [Product, Machine, Slot]\n"));
        assert!(code.contains("EXTERNAL_ENTITIES = [Logger]\n"));
        assert!(code.contains("    \"register_all\",\n"));
    }

    #[test]
    fn test_functions_module() {
        let model = make_test_model();
        let symbols = SymbolTable::from_model(&model);
        let module = generate_functions(&model, &ActionTranslator::new(&symbols));

        assert!(module.code.contains("def restock(rt, count: int = 0, **kwargs):\n"));
        assert!(module.code.contains("    kwargs[\"count\"] = count\n"));
        assert!(module.code.contains("    ps = list(rt.store.select_all(\"Product\"))\n"));
        assert!(module.code.contains("    \"restock\": restock,\n"));
        assert!(module.notes.is_empty());
    }

    #[test]
    fn test_app_entry_point() {
        let code = generate_app(&make_test_model());
        assert!(code.starts_with("#!/usr/bin/env python3\n"));
        assert!(code.contains("import functions\n"));
        assert!(code.contains("    instances[\"machine\"] = rt.create(\"Machine\", id=\"machine_1\")\n"));
        assert!(!code.contains("rt.create(\"Logger\""));
        assert!(code.contains("    main_instance = instances.get(\"machine\")\n"));
        assert!(code.contains("        # main_instance.dispatch_event(\"Coin\", amount=0)\n"));
    }

    #[test]
    fn test_app_without_functions() {
        let mut model = make_test_model();
        model.functions.clear();
        let code = generate_app(&model);
        assert!(!code.contains("import functions"));
        assert!(!code.contains("functions.register_all"));
    }
}
