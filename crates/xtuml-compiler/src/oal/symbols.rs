//! Symbol information for action translation.
//!
//! `obj.field` in OAL can be an attribute read or an operation reference.
//! The table records every class's attributes and operations, and
//! [`Scope`] tracks which class each local variable holds, so the
//! translator can decide by lookup instead of by guessing.

use std::collections::{BTreeSet, HashMap};

use crate::ir::Model;

use super::ContextKind;

/// Members of one class.
#[derive(Debug, Clone, Default)]
pub struct ClassSymbols {
    /// Model name of the class.
    pub name: String,
    /// Python identifier the class is generated under.
    pub py_name: String,
    pub key_letters: String,
    pub attributes: BTreeSet<String>,
    pub operations: BTreeSet<String>,
    pub has_state_machine: bool,
}

impl ClassSymbols {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.contains(name)
    }
}

/// All classes of a model, addressable by id, name or key letters.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    classes: Vec<ClassSymbols>,
    index: HashMap<String, usize>,
    /// Lowercased event name to its declared spelling.
    events: HashMap<String, String>,
}

impl SymbolTable {
    pub fn from_model(model: &Model) -> Self {
        let mut table = SymbolTable::default();

        for class in &model.classes {
            let symbols = ClassSymbols {
                name: class.name.clone(),
                py_name: class.py_name.clone(),
                key_letters: class.key_letters.clone(),
                attributes: class.attributes.iter().map(|a| a.name.clone()).collect(),
                operations: class.operations.iter().map(|o| o.name.clone()).collect(),
                has_state_machine: class.state_machine.is_some(),
            };
            table.insert(symbols, &[&class.id]);
        }

        for assoc in &model.association_classes {
            let from = model.class(assoc.from);
            let to = model.class(assoc.to);
            let mut attributes: BTreeSet<String> =
                assoc.attributes.iter().map(|a| a.name.clone()).collect();
            attributes.insert(format!("{}_ref", from.key_letters));
            attributes.insert(format!("{}_ref", to.key_letters));
            let symbols = ClassSymbols {
                name: assoc.name.clone(),
                py_name: assoc.py_name.clone(),
                key_letters: assoc.key_letters.clone(),
                attributes,
                operations: BTreeSet::new(),
                has_state_machine: false,
            };
            table.insert(symbols, &[]);
        }

        for event in &model.events {
            table
                .events
                .entry(event.name.to_lowercase())
                .or_insert_with(|| event.name.clone());
        }

        table
    }

    fn insert(&mut self, symbols: ClassSymbols, extra_keys: &[&str]) {
        let slot = self.classes.len();
        let keys = [symbols.name.as_str(), symbols.key_letters.as_str(), symbols.py_name.as_str()];
        for key in keys.iter().chain(extra_keys.iter()) {
            if !key.is_empty() {
                self.index.entry(key.to_lowercase()).or_insert(slot);
            }
        }
        self.classes.push(symbols);
    }

    pub fn resolve(&self, reference: &str) -> Option<&ClassSymbols> {
        self.index
            .get(&reference.trim().to_lowercase())
            .map(|&slot| &self.classes[slot])
    }

    /// Declared spelling of an event, matched case-insensitively.
    pub fn event_name(&self, name: &str) -> Option<&str> {
        self.events.get(&name.trim().to_lowercase()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Variables visible while translating one action body.
#[derive(Debug, Clone)]
pub struct Scope<'s> {
    pub symbols: &'s SymbolTable,
    pub context: ContextKind,
    owner: Option<&'s ClassSymbols>,
    owner_expr: String,
    locals: HashMap<String, &'s ClassSymbols>,
    /// Variable aliased to `candidate` inside a where-clause.
    candidate: Option<(String, Option<&'s ClassSymbols>)>,
}

impl<'s> Scope<'s> {
    pub fn new(symbols: &'s SymbolTable, context: ContextKind, owner: Option<&str>) -> Self {
        Self {
            symbols,
            context,
            owner: owner.and_then(|o| symbols.resolve(o)),
            owner_expr: "owner".to_string(),
            locals: HashMap::new(),
            candidate: None,
        }
    }

    pub fn owner(&self) -> Option<&'s ClassSymbols> {
        self.owner
    }

    /// Python expression that `self` stands for.
    pub fn owner_expr(&self) -> &str {
        &self.owner_expr
    }

    pub fn set_owner_expr(&mut self, expr: &str) {
        self.owner_expr = expr.to_string();
    }

    /// Records that `var` holds instances of `class_ref`. Unknown classes
    /// forget any earlier binding.
    pub fn bind(&mut self, var: &str, class_ref: &str) {
        match self.symbols.resolve(class_ref) {
            Some(class) => {
                self.locals.insert(var.to_string(), class);
            }
            None => {
                self.locals.remove(var);
            }
        }
    }

    /// Binds `alias` to whatever class `source` holds.
    pub fn bind_like(&mut self, alias: &str, source: &str) {
        match self.class_of(source) {
            Some(class) => {
                self.locals.insert(alias.to_string(), class);
            }
            None => {
                self.locals.remove(alias);
            }
        }
    }

    pub fn unbind(&mut self, var: &str) {
        self.locals.remove(var);
    }

    pub fn class_of(&self, var: &str) -> Option<&'s ClassSymbols> {
        if var == "self" {
            return self.owner;
        }
        if let Some((alias, class)) = &self.candidate {
            if var == alias || var == "selected" || var == "candidate" {
                return *class;
            }
        }
        self.locals.get(var).copied()
    }

    /// Scope for a where-clause: `var` and `selected` read the candidate.
    pub fn with_candidate(&self, var: &str, class_ref: Option<&str>) -> Scope<'s> {
        let mut inner = self.clone();
        let class = class_ref.and_then(|c| self.symbols.resolve(c));
        inner.candidate = Some((var.to_string(), class));
        inner
    }

    pub fn is_candidate(&self, var: &str) -> bool {
        var == "selected"
            || self
                .candidate
                .as_ref()
                .is_some_and(|(alias, _)| alias == var)
    }
}
