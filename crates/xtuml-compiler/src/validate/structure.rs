//! Shape and referential-integrity checks on the raw model document.

use std::collections::HashMap;

use serde_json::Value;

use crate::diagnostic::ValidationIssue;
use crate::frontend::document::{self as doc, text};
use crate::ir::{is_many, parse_parameters, OalType};

use super::References;

/// Top-level collections must be arrays. These issues are returned alone:
/// nothing else can be checked without them.
pub fn check_shape(document: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if !document.is_object() {
        issues.push(ValidationIssue::new("root", "Input must be a JSON object"));
        return issues;
    }

    if let Some((key, value)) = doc::classes_field(document) {
        if !value.is_array() {
            issues.push(ValidationIssue::new(
                "classes",
                format!("`{}` must be an array of classes", key),
            ));
        }
    }

    for key in doc::COLLECTION_KEYS {
        match document.get(*key) {
            None | Some(Value::Null) | Some(Value::Array(_)) => {}
            Some(_) => issues.push(ValidationIssue::new(
                *key,
                format!("`{}` must be an array if provided", key),
            )),
        }
    }

    issues
}

/// Accumulates structural issues and the reference sets the lint needs.
pub struct StructureChecker<'d> {
    document: &'d Value,
    issues: Vec<ValidationIssue>,
    /// Lowercased id, name and key letters -> class index.
    registry: HashMap<String, usize>,
    refs: References,
}

impl<'d> StructureChecker<'d> {
    pub fn new(document: &'d Value) -> Self {
        Self {
            document,
            issues: Vec::new(),
            registry: HashMap::new(),
            refs: References::default(),
        }
    }

    pub fn run(mut self) -> (Vec<ValidationIssue>, References) {
        self.check_classes();
        self.check_attributes();
        self.check_relationships();
        self.check_generalizations();
        self.check_events();
        self.check_state_machines();
        self.check_callable_parameters();
        (self.issues, self.refs)
    }

    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(path, message));
    }

    fn push_hint(&mut self, path: impl Into<String>, message: impl Into<String>, hint: impl Into<String>) {
        self.issues
            .push(ValidationIssue::new(path, message).with_hint(hint));
    }

    fn resolves(&self, reference: &str) -> bool {
        self.registry.contains_key(&reference.trim().to_lowercase())
    }

    fn class_index(&self, reference: &str) -> Option<usize> {
        self.registry.get(&reference.trim().to_lowercase()).copied()
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn check_classes(&mut self) {
        let mut seen: [HashMap<String, usize>; 3] = Default::default();
        const FIELDS: [&str; 3] = ["class_id", "class_name", "KL"];

        let document = self.document;
        for (idx, class) in doc::classes(document).iter().enumerate() {
            let path = format!("classes[{}]", idx);
            if !class.is_object() {
                self.push(path, "Class entry must be an object");
                continue;
            }

            if class.get("class_id").map_or(true, Value::is_null) {
                self.push(format!("{}.class_id", path), "Missing required field `class_id`");
            }
            if text(class, &["class_name"]).is_none() {
                self.push(format!("{}.class_name", path), "Missing required field `class_name`");
            }
            if text(class, &["KL"]).is_none() {
                self.push_hint(
                    format!("{}.KL", path),
                    "Missing required field `KL` (key letters)",
                    "Provide a short unique code, e.g. VM",
                );
            }

            for (field, seen) in FIELDS.iter().zip(seen.iter_mut()) {
                let Some(value) = text(class, &[*field]) else {
                    continue;
                };
                let key = value.to_lowercase();
                match seen.get(&key) {
                    Some(&earlier) => self.issues.push(
                        ValidationIssue::new(
                            format!("{}.{}", path, field),
                            format!("Duplicate {} '{}' (also used by classes[{}])", field, value, earlier),
                        )
                        .with_hint(format!("Conflicts with classes[{}]", earlier)),
                    ),
                    None => {
                        seen.insert(key.clone(), idx);
                    }
                }
                self.registry.entry(key.clone()).or_insert(idx);
                self.refs.classes.insert(key);
            }

            for list in ["attributes", "operations", "states"] {
                if class.get(list).is_some_and(|v| !v.is_null() && !v.is_array()) {
                    self.push(format!("{}.{}", path, list), format!("`{}` must be an array", list));
                }
            }

            for (s_idx, state) in doc::array(class, "states").iter().enumerate() {
                let s_path = format!("{}.states[{}]", path, s_idx);
                if !state.is_object() {
                    self.push(s_path, "State must be an object");
                } else if text(state, &["state_name"]).is_none() {
                    self.push(format!("{}.state_name", s_path), "State missing `state_name`");
                }
            }
        }
    }

    fn check_attributes(&mut self) {
        let document = self.document;
        for (idx, class) in doc::classes(document).iter().enumerate() {
            for (a_idx, attr) in doc::array(class, "attributes").iter().enumerate() {
                let path = format!("classes[{}].attributes[{}]", idx, a_idx);
                if !attr.is_object() {
                    self.push(path, "Attribute must be an object");
                    continue;
                }
                if text(attr, &["attribute_name"]).is_none() {
                    self.push(format!("{}.attribute_name", path), "Attribute missing `attribute_name`");
                }
                if let Some(data_type) = text(attr, &["data_type"]) {
                    if !OalType::parse(&data_type).is_known() {
                        self.push_hint(
                            format!("{}.data_type", path),
                            format!("Unknown data_type '{}'", data_type),
                            "Use boolean, integer, real, string, unique_id, date, timestamp, inst_ref<Class> or inst_ref_set<Class>",
                        );
                    }
                }
                if let Some(related) = text(attr, &["related_class_id", "related_class_name"]) {
                    if !self.resolves(&related) {
                        self.push_hint(
                            format!("{}.related_class_id", path),
                            format!("Unknown related class '{}'", related),
                            "Use a valid class_id, class_name or KL",
                        );
                    }
                }
            }
        }
    }

    // =========================================================================
    // Relationships and generalizations
    // =========================================================================

    fn check_relationships(&mut self) {
        let document = self.document;
        let mut seen_ids: HashMap<String, usize> = HashMap::new();

        for (idx, rel) in doc::array(document, "relationships").iter().enumerate() {
            let path = format!("relationships[{}]", idx);
            if !rel.is_object() {
                self.push(path, "Relationship must be an object");
                continue;
            }

            match text(rel, doc::REL_ID_KEYS) {
                None => self.push(format!("{}.rel_id", path), "Missing `rel_id`"),
                Some(rel_id) => {
                    if !is_relationship_id(&rel_id) {
                        self.push_hint(
                            format!("{}.rel_id", path),
                            format!("Relationship id '{}' is not of the form R<number>", rel_id),
                            "Use ids like R1, R2, R12",
                        );
                    }
                    let key = rel_id.to_lowercase();
                    if let Some(&earlier) = seen_ids.get(&key) {
                        self.push_hint(
                            format!("{}.rel_id", path),
                            format!("Duplicate rel_id '{}' (also used by relationships[{}])", rel_id, earlier),
                            format!("Conflicts with relationships[{}]", earlier),
                        );
                    } else {
                        seen_ids.insert(key.clone(), idx);
                    }
                    self.refs.relationships.insert(key);
                }
            }

            let (from, to) = if doc::is_generalization_relationship(rel) {
                let (sup, sub) = doc::relationship_generalization_ends(rel);
                (sup.or_else(|| text(rel, doc::FROM_KEYS)), sub.or_else(|| text(rel, doc::TO_KEYS)))
            } else {
                (text(rel, doc::FROM_KEYS), text(rel, doc::TO_KEYS))
            };

            for (end, reference) in [("from_class", &from), ("to_class", &to)] {
                match reference {
                    None => self.push(format!("{}.{}", path, end), format!("Missing `{}`", end)),
                    Some(r) if !self.resolves(r) => self.push_hint(
                        format!("{}.{}", path, end),
                        format!("Unknown class reference '{}'", r),
                        format!("Ensure `{}` matches an existing class_id, class_name or KL", end),
                    ),
                    Some(_) => {}
                }
            }

            // Synthesized association classes are valid selection targets.
            if !doc::is_generalization_relationship(rel)
                && text(rel, doc::ASSOCIATION_KEYS).is_none()
                && is_many(&text(rel, doc::FROM_MULTIPLICITY_KEYS).unwrap_or_default())
                && is_many(&text(rel, doc::TO_MULTIPLICITY_KEYS).unwrap_or_default())
            {
                let names = |r: &Option<String>| {
                    r.as_deref()
                        .and_then(|r| self.class_index(r))
                        .and_then(|i| doc::classes(document).get(i))
                        .and_then(|c| text(c, &["class_name"]))
                };
                if let (Some(f), Some(t), Some(rel_id)) =
                    (names(&from), names(&to), text(rel, doc::REL_ID_KEYS))
                {
                    self.refs
                        .classes
                        .insert(format!("{}_{}_{}", f, t, rel_id).to_lowercase());
                }
            }
        }
    }

    fn check_generalizations(&mut self) {
        let document = self.document;
        // sub index -> (super index, path that declared it)
        let mut supers: HashMap<usize, (usize, String)> = HashMap::new();
        let mut pairs: Vec<(String, Option<String>, Option<String>)> = Vec::new();

        for (idx, gen) in doc::array(document, "generalizations").iter().enumerate() {
            let path = format!("generalizations[{}]", idx);
            if !gen.is_object() {
                self.push(path, "Generalization must be an object");
                continue;
            }
            let sup = text(gen, doc::SUPER_KEYS);
            let sub = text(gen, doc::SUB_KEYS);
            for (field, reference, label) in
                [("super_class", &sup, "super"), ("sub_class", &sub, "sub")]
            {
                match reference {
                    None => self.push(
                        format!("{}.{}", path, field),
                        format!("Missing {} class reference", label),
                    ),
                    Some(r) if !self.resolves(r) => self.push(
                        format!("{}.{}", path, field),
                        format!("Unknown {} class reference '{}'", label, r),
                    ),
                    Some(_) => {}
                }
            }
            pairs.push((path, sup, sub));
        }

        for (idx, rel) in doc::array(document, "relationships").iter().enumerate() {
            if rel.is_object() && doc::is_generalization_relationship(rel) {
                let (sup, sub) = doc::relationship_generalization_ends(rel);
                pairs.push((format!("relationships[{}]", idx), sup, sub));
            }
        }

        for (path, sup, sub) in pairs {
            let (Some(sup), Some(sub)) = (
                sup.as_deref().and_then(|r| self.class_index(r)),
                sub.as_deref().and_then(|r| self.class_index(r)),
            ) else {
                continue;
            };
            match supers.get(&sub) {
                Some((existing, earlier)) if *existing != sup => {
                    let name = |i: usize| {
                        doc::classes(document)
                            .get(i)
                            .and_then(|c| text(c, &["class_name"]))
                            .unwrap_or_default()
                    };
                    self.push_hint(
                        path,
                        format!(
                            "Class '{}' already has superclass '{}'; multiple inheritance is not supported",
                            name(sub),
                            name(*existing)
                        ),
                        format!("Conflicts with {}", earlier),
                    );
                }
                Some(_) => {}
                None => {
                    supers.insert(sub, (sup, path));
                }
            }
        }
    }

    // =========================================================================
    // Events and state machines
    // =========================================================================

    fn check_events(&mut self) {
        let document = self.document;
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (idx, event) in doc::array(document, "events").iter().enumerate() {
            let path = format!("events[{}]", idx);
            if !event.is_object() {
                self.push(path, "Event must be an object");
                continue;
            }

            match text(event, &["event_name"]) {
                None => self.push(format!("{}.event_name", path), "Missing `event_name`"),
                Some(name) => {
                    let key = name.to_lowercase();
                    if let Some(&earlier) = seen.get(&key) {
                        self.push_hint(
                            format!("{}.event_name", path),
                            format!("Duplicate event_name '{}' (also used by events[{}])", name, earlier),
                            format!("Conflicts with events[{}]", earlier),
                        );
                    } else {
                        seen.insert(key.clone(), idx);
                    }
                    self.refs.events.insert(key);
                }
            }

            match text(event, &["class_id"]) {
                None => self.push(format!("{}.class_id", path), "Missing `class_id`"),
                Some(class) if !self.resolves(&class) => self.push(
                    format!("{}.class_id", path),
                    format!("Unknown class '{}' for event", class),
                ),
                Some(_) => {}
            }

            for (p_idx, param) in doc::array(event, "parameters").iter().enumerate() {
                self.check_parameter_entry(param, format!("{}.parameters[{}].type", path, p_idx));
            }
        }
    }

    fn check_state_machines(&mut self) {
        let document = self.document;
        for (idx, class) in doc::classes(document).iter().enumerate() {
            let states = doc::array(class, "states");
            let names: Vec<String> = states
                .iter()
                .filter_map(|s| text(s, &["state_name"]))
                .collect();
            // (state, event) -> (row index, next state, action)
            let mut rows: HashMap<(String, String), (usize, String, String)> = HashMap::new();

            for (s_idx, state) in states.iter().enumerate() {
                let path = format!("classes[{}].states[{}]", idx, s_idx);
                let Some(state_name) = text(state, &["state_name"]) else {
                    continue;
                };

                let next = text(state, &["next_state"]);
                if let Some(next) = &next {
                    if !names.contains(next) {
                        self.push_hint(
                            format!("{}.next_state", path),
                            format!("Unknown next_state '{}'", next),
                            "Use a state_name defined in this class",
                        );
                    }
                }
                let next = next.unwrap_or_else(|| state_name.clone());
                let action = doc::action_text(state.get("action"));

                for signature in doc::state_events(state) {
                    let event = doc::event_name(&signature);
                    if event.is_empty() {
                        continue;
                    }
                    if !self.refs.events.contains(&event.to_lowercase()) {
                        self.push_hint(
                            format!("{}.state_event", path),
                            format!("Unknown event '{}'", signature),
                            "Declare the event in the events block",
                        );
                    }

                    let key = (state_name.clone(), event.to_lowercase());
                    match rows.get(&key) {
                        Some((earlier, earlier_next, earlier_action))
                            if *earlier_next != next || *earlier_action != action =>
                        {
                            self.push_hint(
                                format!("{}.state_event", path),
                                format!(
                                    "Conflicting transition for ({}, {}): another row already handles it differently",
                                    state_name, event
                                ),
                                format!("Conflicts with classes[{}].states[{}]", idx, earlier),
                            );
                        }
                        Some(_) => {}
                        None => {
                            rows.insert(key, (s_idx, next.clone(), action.clone()));
                        }
                    }
                }
            }
        }
    }

    // =========================================================================
    // Operation and function parameters
    // =========================================================================

    fn check_callable_parameters(&mut self) {
        let document = self.document;
        for (idx, class) in doc::classes(document).iter().enumerate() {
            for (o_idx, op) in doc::array(class, "operations").iter().enumerate() {
                self.check_callable(op, format!("classes[{}].operations[{}]", idx, o_idx));
            }
        }
        for (idx, function) in doc::array(document, "functions").iter().enumerate() {
            self.check_callable(function, format!("functions[{}]", idx));
        }
    }

    fn check_callable(&mut self, entry: &Value, path: String) {
        match entry {
            Value::String(sig) => {
                if let Some(params) = doc::split_signature(sig).1 {
                    self.check_parameter_text(&params, format!("{}.parameters", path));
                }
            }
            Value::Object(_) => match entry.get("parameters").or_else(|| entry.get("params")) {
                Some(Value::Array(items)) => {
                    for (p_idx, param) in items.iter().enumerate() {
                        self.check_parameter_entry(param, format!("{}.parameters[{}]", path, p_idx));
                    }
                }
                Some(Value::String(params)) => {
                    self.check_parameter_text(params, format!("{}.parameters", path));
                }
                _ => {
                    if let Some(params) = doc::callable_signature(entry).and_then(|s| doc::split_signature(&s).1) {
                        self.check_parameter_text(&params, format!("{}.parameters", path));
                    }
                }
            },
            _ => self.push(path, "Operation must be a signature string or an object"),
        }
    }

    fn check_parameter_entry(&mut self, param: &Value, path: String) {
        match param {
            Value::String(s) => self.check_parameter_text(s, path),
            Value::Object(_) => {
                if let Some(typ) = doc::parameter_type(param) {
                    if !OalType::parse(&typ).is_known() {
                        self.push(path, format!("Unknown parameter type '{}'", typ));
                    }
                }
            }
            _ => {}
        }
    }

    fn check_parameter_text(&mut self, params: &str, path: String) {
        for param in parse_parameters(params) {
            if !param.data_type.is_known() {
                self.push(path.clone(), format!("Unknown parameter type '{}'", param.data_type));
            }
        }
    }
}

/// `R` followed by digits, case-insensitive.
fn is_relationship_id(rel_id: &str) -> bool {
    let mut chars = rel_id.chars();
    matches!(chars.next(), Some('R' | 'r'))
        && rel_id.len() > 1
        && chars.all(|c| c.is_ascii_digit())
}
