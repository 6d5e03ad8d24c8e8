//! Statement-level translation of OAL action bodies into Python.
//!
//! Indentation follows the block keywords: `if`/`for each`/`while` open a
//! level, `elif`/`else` re-open it, `end ...` closes it. The level never
//! goes below zero, and a block that ends up empty gets a `pass`.

use std::collections::BTreeMap;

use crate::diagnostic::{NoteKind, TranslationNote};

use super::ast::{Argument, AssignTarget, Cardinality, Hop, Statement};
use super::expr::ExprTranslator;
use super::parser::parse_body;
use super::symbols::{Scope, SymbolTable};
use super::ContextKind;

const INDENT: &str = "    ";

/// Where an action body is being inlined.
#[derive(Debug, Clone)]
pub struct ActionContext<'m> {
    /// Class that owns the action, by name or key letters.
    pub class: Option<&'m str>,
    /// Python expression standing for `self`.
    pub owner: &'m str,
    pub context: ContextKind,
    /// Prefix for every emitted line.
    pub base_indent: &'m str,
    /// Event name to the origin state of its first transition.
    pub event_states: &'m BTreeMap<String, String>,
}

/// Translated body plus the notes collected while translating it.
#[derive(Debug, Clone, Default)]
pub struct Translation {
    pub code: String,
    pub notes: Vec<TranslationNote>,
}

/// Translates action bodies against a model's symbols.
pub struct ActionTranslator<'s> {
    symbols: &'s SymbolTable,
}

impl<'s> ActionTranslator<'s> {
    pub fn new(symbols: &'s SymbolTable) -> Self {
        Self { symbols }
    }

    pub fn translate(&self, body: &str, ctx: &ActionContext<'_>) -> Translation {
        let mut scope = Scope::new(self.symbols, ctx.context, ctx.class);
        scope.set_owner_expr(ctx.owner);

        let mut emitter = Emitter::new(ctx.base_indent);
        for line in parse_body(body) {
            let mut session = Session {
                ctx,
                scope: &mut scope,
                emitter: &mut emitter,
                line_no: line.line_no,
            };
            session.statement(&line.statement, &line.text);
        }

        emitter.finish()
    }
}

/// Output lines with block bookkeeping.
struct Emitter {
    base: String,
    lines: Vec<String>,
    level: usize,
    /// One entry per open block: whether it received a statement yet.
    blocks: Vec<bool>,
    executable: usize,
    notes: Vec<TranslationNote>,
}

impl Emitter {
    fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            lines: Vec::new(),
            level: 0,
            blocks: Vec::new(),
            executable: 0,
            notes: Vec::new(),
        }
    }

    fn line_at(&mut self, extra: usize, text: &str) {
        self.lines.push(format!(
            "{}{}{}",
            self.base,
            INDENT.repeat(self.level + extra),
            text
        ));
    }

    /// An executable statement at the current level.
    fn emit(&mut self, text: &str) {
        self.line_at(0, text);
        self.executable += 1;
        if let Some(has_body) = self.blocks.last_mut() {
            *has_body = true;
        }
    }

    /// A comment; does not count as a block body.
    fn comment(&mut self, text: &str) {
        if text.is_empty() {
            self.line_at(0, "#");
        } else {
            self.line_at(0, &format!("# {}", text));
        }
    }

    fn open(&mut self, header: &str) {
        self.emit(header);
        self.level += 1;
        self.blocks.push(false);
    }

    fn close(&mut self) {
        if self.blocks.last() == Some(&false) {
            self.line_at(0, "pass");
        }
        self.blocks.pop();
        self.level = self.level.saturating_sub(1);
    }

    /// `elif` / `else`: close the branch and open the next one.
    fn reopen(&mut self, header: &str) {
        self.close();
        self.line_at(0, header);
        self.level += 1;
        self.blocks.push(false);
    }

    fn finish(mut self) -> Translation {
        while !self.blocks.is_empty() {
            self.close();
        }
        if self.executable == 0 {
            self.level = 0;
            self.line_at(0, "pass");
        }
        let mut code = self.lines.join("\n");
        code.push('\n');
        Translation {
            code,
            notes: self.notes,
        }
    }
}

struct Session<'a, 'c, 's> {
    ctx: &'a ActionContext<'c>,
    scope: &'a mut Scope<'s>,
    emitter: &'a mut Emitter,
    line_no: usize,
}

impl<'a, 'c, 's> Session<'a, 'c, 's> {
    fn statement(&mut self, statement: &Statement, text: &str) {
        match statement {
            Statement::Comment(comment) => self.emitter.comment(comment),

            Statement::If { condition } => {
                let cond = self.expr(condition);
                self.emitter.open(&format!("if {}:", cond));
            }
            Statement::ElseIf { condition } => {
                let cond = self.expr(condition);
                self.emitter.reopen(&format!("elif {}:", cond));
            }
            Statement::Else => self.emitter.reopen("else:"),
            Statement::EndIf | Statement::EndFor | Statement::EndWhile => self.emitter.close(),
            Statement::ForEach { var, collection } => {
                let items = self.expr(collection);
                self.scope.bind_like(var, collection.trim());
                self.emitter.open(&format!("for {} in ({} or []):", var, items));
            }
            Statement::While { condition } => {
                let cond = self.expr(condition);
                self.emitter.open(&format!("while {}:", cond));
            }
            Statement::Break => self.emitter.emit("break"),
            Statement::Continue => self.emitter.emit("continue"),
            Statement::Return { value } => match value {
                Some(value) => {
                    let value = self.expr(value);
                    self.emitter.emit(&format!("return {}", value));
                }
                None => self.emitter.emit("return"),
            },

            Statement::SelectFromInstances {
                cardinality,
                var,
                class_ref,
                condition,
            } => self.select_instances(*cardinality, var, class_ref, condition.as_deref(), text),
            Statement::SelectRelated {
                cardinality,
                var,
                source,
                hops,
                condition,
            } => self.select_related(*cardinality, var, source, hops, condition.as_deref(), text),
            Statement::CreateObject { var, class_ref } => {
                let class = self.class_literal(class_ref);
                self.scope.bind(var, class_ref);
                self.emitter.emit(&format!("{} = rt.create({})", var, class));
            }
            Statement::DeleteObject { var } => {
                let target = self.var(var);
                self.emitter.emit(&format!(
                    "if {0} is not None: rt.store.delete_instance({0})",
                    target
                ));
            }

            Statement::Relate {
                source,
                target,
                rel_id,
                using,
            } => {
                let (a, b) = (self.var(source), self.var(target));
                match using {
                    Some(link) => {
                        let link = self.var(link);
                        self.emitter.emit(&format!(
                            "rt.links.relate_all(\"{}\", [({}, {}), ({}, {})])",
                            rel_id, a, link, link, b
                        ));
                    }
                    None => self
                        .emitter
                        .emit(&format!("rt.links.relate(\"{}\", {}, {})", rel_id, a, b)),
                }
            }
            Statement::Unrelate {
                source,
                target,
                rel_id,
                using,
            } => {
                let (a, b) = (self.var(source), self.var(target));
                match using {
                    Some(link) => {
                        let link = self.var(link);
                        self.emitter
                            .emit(&format!("rt.links.unrelate(\"{}\", {}, {})", rel_id, a, link));
                        self.emitter
                            .emit(&format!("rt.links.unrelate(\"{}\", {}, {})", rel_id, link, b));
                    }
                    None => self
                        .emitter
                        .emit(&format!("rt.links.unrelate(\"{}\", {}, {})", rel_id, a, b)),
                }
            }
            Statement::UnrelateNavigated {
                source,
                nav_source,
                nav,
                rel_id,
            } => {
                let a = self.var(source);
                let from = self.var(nav_source);
                let class = self.class_name_text(&nav.class);
                self.emitter.emit(&format!(
                    "_linked = rt.links.select_one_related(\"{}\", {}, {})",
                    nav.rel_id, from, class
                ));
                self.emitter.emit(&format!(
                    "if _linked is not None: rt.links.unrelate(\"{}\", {}, _linked)",
                    rel_id, a
                ));
            }

            Statement::Send {
                message,
                args,
                target,
            } => {
                let payload = self.payload(args);
                self.emitter.emit(&format!(
                    "rt.services.send_message({}, \"{}\", {})",
                    quote(target),
                    message,
                    payload
                ));
            }
            Statement::CreateEvent {
                var,
                label,
                args,
                target,
                ..
            } => {
                let payload = self.payload(args);
                let target = self.expr(target);
                self.scope.unbind(var);
                self.emitter.emit(&format!(
                    "{} = EventInstance(\"{}\", {}, {})",
                    var, label, target, payload
                ));
            }
            Statement::Generate {
                event, args, target, ..
            } => self.generate(event, args, target, text),
            Statement::GenerateInstance { var } => {
                let event = self.var(var);
                self.emitter.emit(&format!("rt.services.deliver({})", event));
            }

            Statement::BridgeCall {
                entity,
                operation,
                args,
            } => {
                let call_args = self.call_args(args);
                let call = format!("rt.bridge(\"{}\", \"{}\"{})", entity, operation, call_args);
                self.guarded(&call, &format!("bridge {}::{} failed", entity, operation));
            }
            Statement::FunctionCall { name, args } => {
                let call_args = self.call_args(args);
                let call = format!("rt.call_function(\"{}\"{})", name, call_args);
                self.guarded(&call, &format!("function {} failed", name));
            }
            Statement::MethodCall {
                object,
                method,
                args,
            } => {
                let target = self.var(object);
                let call_args = self.call_args(args);
                let call_args = call_args.trim_start_matches(", ");
                self.emitter.emit(&format!(
                    "if hasattr({0}, '{1}'): {0}.{1}({2})",
                    target, method, call_args
                ));
            }
            Statement::Assign { target, value } => self.assign(target, value),

            Statement::Unrecognized(line) => {
                self.note(NoteKind::Unparsed, format!("statement not recognized: '{}'", line));
                self.emitter.comment(&format!("Unparsed OAL: {}", line));
            }
        }
    }

    fn select_instances(
        &mut self,
        cardinality: Cardinality,
        var: &str,
        class_ref: &str,
        condition: Option<&str>,
        text: &str,
    ) {
        let class = self.class_literal(class_ref);
        self.emitter.comment(&format!("[Instance Selection] {}", text));
        let source = format!("rt.store.select_all({})", class);
        self.bind_selection(cardinality, var, &source, Some(class_ref), condition, Some(class));
        self.scope.bind(var, class_ref);
    }

    fn select_related(
        &mut self,
        cardinality: Cardinality,
        var: &str,
        source: &str,
        hops: &[Hop],
        condition: Option<&str>,
        text: &str,
    ) {
        let from = self.var(source);
        self.emitter.comment(&format!("[Navigation] {}", text));

        let target = hops.last().map(|h| h.class.as_str());
        let related = match hops {
            [hop] => format!(
                "rt.links.select_related(\"{}\", {}, {})",
                hop.rel_id,
                from,
                self.class_name_text(&hop.class)
            ),
            _ => {
                let steps: Vec<String> = hops
                    .iter()
                    .map(|h| format!("(\"{}\", {})", h.rel_id, self.class_name_text(&h.class)))
                    .collect();
                format!("rt.links.navigate({}, [{}])", from, steps.join(", "))
            }
        };

        self.bind_selection(cardinality, var, &related, target, condition, None);
        match target {
            Some(class) => self.scope.bind(var, class),
            None => self.scope.unbind(var),
        }
    }

    /// Assigns a selection result: the first match (or None) for any/one,
    /// the list for many.
    fn bind_selection(
        &mut self,
        cardinality: Cardinality,
        var: &str,
        source: &str,
        class_ref: Option<&str>,
        condition: Option<&str>,
        store_class: Option<String>,
    ) {
        let line = match (condition, cardinality.is_many()) {
            (Some(cond), true) => {
                let cond = self.where_expr(var, class_ref, cond);
                format!("{} = [candidate for candidate in {} if {}]", var, source, cond)
            }
            (Some(cond), false) => {
                let cond = self.where_expr(var, class_ref, cond);
                format!(
                    "{} = next((candidate for candidate in {} if {}), None)",
                    var, source, cond
                )
            }
            (None, true) => format!("{} = list({})", var, source),
            (None, false) => match store_class {
                Some(class) => format!("{} = rt.store.select_any({})", var, class),
                None => format!("{} = next(iter({}), None)", var, source),
            },
        };
        self.emitter.emit(&line);
    }

    fn generate(&mut self, event: &str, args: &[Argument], target: &str, text: &str) {
        let payload = self.payload(args);
        let target_expr = self.expr(target);
        self.emitter.comment(&format!("[Event Generation] {}", text));

        // Dispatch tables are keyed by the declared spelling.
        let declared = self
            .scope
            .symbols
            .event_name(event)
            .or_else(|| {
                self.ctx
                    .event_states
                    .keys()
                    .find(|name| name.eq_ignore_ascii_case(event))
                    .map(String::as_str)
            })
            .unwrap_or(event)
            .to_string();
        let event = declared.as_str();

        let targets_owner = target.trim() == "self" || target_expr == self.ctx.owner;
        if targets_owner {
            if let Some(origin) = self.ctx.event_states.get(event) {
                self.emitter.emit(&format!(
                    "if {0}.sm is not None: {0}.sm.force_state('{1}')",
                    self.ctx.owner, origin
                ));
            }
        }

        self.emitter.emit(&format!(
            "if getattr({0}, 'sm', None) is not None: {0}.sm.dispatch(\"{1}\", {2})",
            target_expr, event, payload
        ));
    }

    fn assign(&mut self, target: &AssignTarget, value: &str) {
        let rhs = self.expr(value);
        match target {
            AssignTarget::Attribute { object, attribute } => {
                let mut checker = ExprTranslator::new(self.scope);
                checker.check_attribute(object.trim(), attribute);
                let notes = checker.into_notes();
                self.absorb(notes);

                let object = self.var(object);
                self.emitter
                    .emit(&format!("{}.set_attr('{}', {})", object, attribute, rhs));
            }
            AssignTarget::Local(name) => {
                let simple = value.trim().trim_end_matches(';').trim();
                if simple.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    self.scope.bind_like(name, simple);
                } else {
                    self.scope.unbind(name);
                }
                self.emitter.emit(&format!("{} = {}", name, rhs));
            }
        }
    }

    fn guarded(&mut self, call: &str, failure: &str) {
        self.emitter.emit("try:");
        self.emitter.line_at(1, call);
        self.emitter.line_at(0, "except Exception as exc:");
        self.emitter
            .line_at(1, &format!("rt.report(\"{}\", exc)", failure));
    }

    // =========================================================================
    // Pieces
    // =========================================================================

    fn expr(&mut self, text: &str) -> String {
        let mut translator = ExprTranslator::new(self.scope);
        let out = translator.translate(text);
        let notes = translator.into_notes();
        self.absorb(notes);
        out
    }

    fn where_expr(&mut self, var: &str, class_ref: Option<&str>, text: &str) -> String {
        let inner = self.scope.with_candidate(var, class_ref);
        let mut translator = ExprTranslator::new(&inner);
        let out = translator.translate(text);
        let notes = translator.into_notes();
        self.absorb(notes);
        out
    }

    fn absorb(&mut self, notes: Vec<TranslationNote>) {
        let location = format!("line{}", self.line_no);
        self.emitter
            .notes
            .extend(notes.into_iter().map(|n| n.under(&location)));
    }

    fn note(&mut self, kind: NoteKind, message: String) {
        self.emitter.notes.push(TranslationNote::new(
            format!("line{}", self.line_no),
            kind,
            message,
        ));
    }

    fn var(&self, name: &str) -> String {
        match name.trim() {
            "self" => self.ctx.owner.to_string(),
            "rcvd_evt" => "payload".to_string(),
            "selected" => "candidate".to_string(),
            other => other.to_string(),
        }
    }

    /// Quoted class name for store lookups; unknown classes resolve at run
    /// time through the registry.
    fn class_literal(&mut self, class_ref: &str) -> String {
        match self.scope.symbols.resolve(class_ref) {
            Some(class) => format!("\"{}\"", class.py_name),
            None => {
                self.note(
                    NoteKind::LateBoundClass,
                    format!("class '{}' is resolved at run time", class_ref),
                );
                format!("rt.class_name(\"{}\")", class_ref)
            }
        }
    }

    /// Quoted class name for link filtering; unknown names pass through.
    fn class_name_text(&self, class_ref: &str) -> String {
        match self.scope.symbols.resolve(class_ref) {
            Some(class) => format!("\"{}\"", class.py_name),
            None => quote(class_ref),
        }
    }

    /// `{'name': value, ...}`; unnamed arguments are keyed by position.
    fn payload(&mut self, args: &[Argument]) -> String {
        let entries: Vec<String> = args
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                let key = arg.name.clone().unwrap_or_else(|| format!("arg{}", i));
                format!("'{}': {}", key, self.expr(&arg.value))
            })
            .collect();
        format!("{{{}}}", entries.join(", "))
    }

    /// `, a, name=b` suffix for a call.
    fn call_args(&mut self, args: &[Argument]) -> String {
        args.iter()
            .map(|arg| {
                let value = self.expr(&arg.value);
                match &arg.name {
                    Some(name) => format!(", {}={}", name, value),
                    None => format!(", {}", value),
                }
            })
            .collect()
    }
}

fn quote(text: &str) -> String {
    serde_json::to_string(text.trim()).unwrap_or_else(|_| format!("\"{}\"", text.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Attribute, Class, EventDef, Model, Operation, StateMachine};

    fn make_model() -> Model {
        Model {
            classes: vec![
                Class {
                    id: "1".into(),
                    name: "VendingMachine".into(),
                    key_letters: "VM".into(),
                    py_name: "VendingMachine".into(),
                    attributes: vec![Attribute { name: "balance".into(), ..Default::default() }],
                    operations: vec![Operation { name: "refund".into(), ..Default::default() }],
                    state_machine: Some(StateMachine::default()),
                    ..Default::default()
                },
                Class {
                    id: "2".into(),
                    name: "Product".into(),
                    key_letters: "PRD".into(),
                    py_name: "Product".into(),
                    attributes: vec![
                        Attribute { name: "price".into(), ..Default::default() },
                        Attribute { name: "stock".into(), ..Default::default() },
                    ],
                    ..Default::default()
                },
            ],
            events: vec![EventDef {
                name: "Dispense".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn translate_with(body: &str, states: &BTreeMap<String, String>) -> Translation {
        let model = make_model();
        let symbols = SymbolTable::from_model(&model);
        let ctx = ActionContext {
            class: Some("VendingMachine"),
            owner: "owner",
            context: ContextKind::StateAction,
            base_indent: "",
            event_states: states,
        };
        ActionTranslator::new(&symbols).translate(body, &ctx)
    }

    fn translate(body: &str) -> Translation {
        translate_with(body, &BTreeMap::new())
    }

    #[test]
    fn indents_nested_blocks() {
        let out = translate(
            "if (self.balance > 0)\n  self.balance = 0;\nelse\n  x = 1;\nend if",
        );
        assert_eq!(
            out.code,
            "if owner.get_attr('balance') > 0:\n    owner.set_attr('balance', 0)\nelse:\n    x = 1\n"
        );
    }

    #[test]
    fn notes_unknown_attribute_writes() {
        let out = translate("self.colour = 1;");
        assert_eq!(out.code, "owner.set_attr('colour', 1)\n");
        assert_eq!(out.notes.len(), 1);
        assert_eq!(out.notes[0].location, "line1");
        assert!(out.notes[0].message.contains("colour"));

        assert!(translate("self.balance = 1;").notes.is_empty());
    }

    #[test]
    fn pads_empty_blocks_with_pass() {
        let out = translate("while (x < 3)\nend while");
        assert_eq!(out.code, "while x < 3:\n    pass\n");
    }

    #[test]
    fn indent_never_goes_negative() {
        let out = translate("end if\nend for\nx = 1;");
        assert_eq!(out.code, "x = 1\n");
    }

    #[test]
    fn empty_body_is_pass() {
        assert_eq!(translate("").code, "pass\n");
        assert_eq!(translate("// nothing").code, "# nothing\npass\n");
    }

    #[test]
    fn base_indent_prefixes_lines() {
        let model = make_model();
        let symbols = SymbolTable::from_model(&model);
        let states = BTreeMap::new();
        let ctx = ActionContext {
            class: Some("VM"),
            owner: "owner",
            context: ContextKind::Operation,
            base_indent: "        ",
            event_states: &states,
        };
        let out = ActionTranslator::new(&symbols).translate("for each p in items\nbreak;\nend for", &ctx);
        assert_eq!(out.code, "        for p in (items or []):\n            break\n");
    }

    #[test]
    fn selects_with_where_and_binds_type() {
        let out = translate(
            "select any p from instances of PRD where (p.stock > 0);\nx = p.price;",
        );
        assert!(out.code.contains(
            "p = next((candidate for candidate in rt.store.select_all(\"Product\") if candidate.get_attr('stock') > 0), None)"
        ));
        assert!(out.code.contains("x = p.get_attr('price')"));
        assert!(out.notes.is_empty());
    }

    #[test]
    fn selects_many_without_where() {
        let out = translate("select many ps from instances of Product;");
        assert!(out.code.contains("ps = list(rt.store.select_all(\"Product\"))"));
        let out = translate("select one p from instances of Product;");
        assert!(out.code.contains("p = rt.store.select_any(\"Product\")"));
    }

    #[test]
    fn unknown_class_is_late_bound() {
        let out = translate("create object instance g of Gadget;");
        assert!(out.code.contains("g = rt.create(rt.class_name(\"Gadget\"))"));
        assert_eq!(out.notes.len(), 1);
        assert_eq!(out.notes[0].kind, NoteKind::LateBoundClass);
        assert_eq!(out.notes[0].location, "line1");
    }

    #[test]
    fn navigates_relationships() {
        let out = translate("select many ps related by self->Product[R1];");
        assert!(out.code.contains("ps = list(rt.links.select_related(\"R1\", owner, \"Product\"))"));
        let out = translate("select any p related by self->Slot[R1]->Product[R2];");
        assert!(out.code.contains(
            "p = next(iter(rt.links.navigate(owner, [(\"R1\", \"Slot\"), (\"R2\", \"Product\")])), None)"
        ));
    }

    #[test]
    fn translates_lifecycle_and_links() {
        let out = translate(
            "create object instance p of Product;\nrelate self to p across R1;\nunrelate self from p across R1;\ndelete object instance p;",
        );
        assert!(out.code.contains("p = rt.create(\"Product\")"));
        assert!(out.code.contains("rt.links.relate(\"R1\", owner, p)"));
        assert!(out.code.contains("rt.links.unrelate(\"R1\", owner, p)"));
        assert!(out.code.contains("if p is not None: rt.store.delete_instance(p)"));
    }

    #[test]
    fn relate_using_is_atomic() {
        let out = translate("relate a to b across R3 using l;");
        assert!(out.code.contains("rt.links.relate_all(\"R3\", [(a, l), (l, b)])"));
    }

    #[test]
    fn unrelates_navigated_instance() {
        let out = translate("unrelate p from self->Product[R1] across R2;");
        assert!(out.code.contains("_linked = rt.links.select_one_related(\"R1\", owner, \"Product\")"));
        assert!(out.code.contains("if _linked is not None: rt.links.unrelate(\"R2\", p, _linked)"));
    }

    #[test]
    fn generate_to_self_forces_origin_state() {
        let mut states = BTreeMap::new();
        states.insert("Dispense".to_string(), "Ready".to_string());
        let out = translate_with("generate VM:Dispense(slot: 2) to self;", &states);
        assert!(out.code.contains("if owner.sm is not None: owner.sm.force_state('Ready')"));
        assert!(out.code.contains(
            "if getattr(owner, 'sm', None) is not None: owner.sm.dispatch(\"Dispense\", {'slot': 2})"
        ));
    }

    #[test]
    fn generate_uses_declared_event_spelling() {
        let mut states = BTreeMap::new();
        states.insert("Dispense".to_string(), "Ready".to_string());
        let out = translate_with("generate VM:dispense() to self;", &states);
        assert!(out.code.contains("owner.sm.force_state('Ready')"));
        assert!(out.code.contains("owner.sm.dispatch(\"Dispense\", {})"));
        assert!(!out.code.contains("\"dispense\""));
    }

    #[test]
    fn generate_to_other_instance_does_not_force() {
        let mut states = BTreeMap::new();
        states.insert("Dispense".to_string(), "Ready".to_string());
        let out = translate_with("generate VM:Dispense() to machine;", &states);
        assert!(!out.code.contains("force_state"));
        assert!(out.code.contains("machine.sm.dispatch(\"Dispense\", {})"));
    }

    #[test]
    fn translates_events_and_messages() {
        let out = translate(
            "create event instance e of VM:Tick(n: 1) to self;\ngenerate e;\nsend Beep(level: 3) to Speaker;",
        );
        assert!(out.code.contains("e = EventInstance(\"Tick\", owner, {'n': 1})"));
        assert!(out.code.contains("rt.services.deliver(e)"));
        assert!(out.code.contains("rt.services.send_message(\"Speaker\", \"Beep\", {'level': 3})"));
    }

    #[test]
    fn guards_bridge_and_function_calls() {
        let out = translate("LOG::LogInfo(message: \"hi\");\nrestock(count: self.balance);");
        assert_eq!(
            out.code,
            "try:\n    rt.bridge(\"LOG\", \"LogInfo\", message=\"hi\")\nexcept Exception as exc:\n    rt.report(\"bridge LOG::LogInfo failed\", exc)\n\
try:\n    rt.call_function(\"restock\", count=owner.get_attr('balance'))\nexcept Exception as exc:\n    rt.report(\"function restock failed\", exc)\n"
        );
    }

    #[test]
    fn method_calls_are_guarded_by_hasattr() {
        let out = translate("self.refund(amount: 2);");
        assert!(out.code.contains("if hasattr(owner, 'refund'): owner.refund(amount=2)"));
    }

    #[test]
    fn unrecognized_lines_become_comments() {
        let out = translate("do the thing");
        assert_eq!(out.code, "# Unparsed OAL: do the thing\npass\n");
        assert_eq!(out.notes[0].kind, NoteKind::Unparsed);
    }
}
