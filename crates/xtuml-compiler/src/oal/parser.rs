//! Recursive-descent parser for OAL statements.
//!
//! Every line of an action body is parsed independently into a
//! [`Statement`]. Both the validator's lint and the translator consume this
//! output, so a line is recognized by one grammar only.

use super::ast::{Argument, AssignTarget, Cardinality, Hop, ParsedLine, Statement};
use super::lexer::{significant, tokenize, Token, TokenKind};

/// Words that never name a free function.
const RESERVED: &[&str] = &[
    "print", "select", "create", "delete", "relate", "unrelate", "generate", "if", "while",
    "for", "return", "send", "elif", "else", "end", "assign", "break", "continue",
];

/// Parses a whole action body. Blank lines are skipped but still counted,
/// and lines inside a `/* ... */` block are comments.
pub fn parse_body(body: &str) -> Vec<ParsedLine> {
    let mut parsed = Vec::new();
    let mut in_block_comment = false;

    for (idx, raw) in body.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let statement = if in_block_comment {
            if line.contains("*/") {
                in_block_comment = false;
            }
            Statement::Comment(strip_comment(line))
        } else {
            if line.starts_with("/*") && !line.contains("*/") {
                in_block_comment = true;
            }
            parse_line(line)
        };

        parsed.push(ParsedLine {
            line_no: idx + 1,
            text: line.to_string(),
            statement,
        });
    }

    parsed
}

/// Parses one trimmed line.
pub fn parse_line(line: &str) -> Statement {
    let line = line.trim();
    if line.starts_with("//") || line.starts_with('#') || line.starts_with("/*") || line.starts_with("*/") {
        return Statement::Comment(strip_comment(line));
    }

    let tokens = significant(&tokenize(line));
    let mut parser = Parser { src: line, toks: tokens, pos: 0 };
    parser
        .statement()
        .unwrap_or_else(|| Statement::Unrecognized(line.to_string()))
}

fn strip_comment(line: &str) -> String {
    let mut text = line.trim();
    for prefix in ["//", "/*", "*/", "#", "*"] {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest;
            break;
        }
    }
    text.trim_start_matches('/')
        .trim_end_matches("*/")
        .trim()
        .to_string()
}

struct Parser<'a> {
    src: &'a str,
    toks: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn statement(&mut self) -> Option<Statement> {
        let first = self.peek()?.clone();

        if first.is_ident() {
            let kw = first.text.to_ascii_lowercase();
            match kw.as_str() {
                "if" => return self.conditional(|condition| Statement::If { condition }),
                "elif" => return self.conditional(|condition| Statement::ElseIf { condition }),
                "while" => return self.conditional(|condition| Statement::While { condition }),
                "else" => return self.else_branch(),
                "end" => return self.end_block(),
                "for" => return self.for_each(),
                "break" => return self.bare(Statement::Break),
                "continue" => return self.bare(Statement::Continue),
                "return" => {
                    self.pos += 1;
                    let value = self.rest();
                    return Some(Statement::Return {
                        value: (!value.is_empty()).then(|| value.to_string()),
                    });
                }
                "select" => return self.select(),
                "create" => return self.create(),
                "delete" => return self.delete(),
                "relate" => return self.relate(),
                "unrelate" => return self.unrelate(),
                "send" => return self.send(),
                "generate" => return self.generate(),
                "assign" => {
                    self.pos += 1;
                    return self.assignment();
                }
                _ => {}
            }
        }

        self.call_or_assignment()
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    fn conditional(&mut self, build: impl FnOnce(String) -> Statement) -> Option<Statement> {
        self.pos += 1;
        let condition = self.condition()?;
        Some(build(condition))
    }

    /// `(cond)` when the group spans the rest of the line, else the raw rest.
    fn condition(&mut self) -> Option<String> {
        let end = self.content_end();
        if self.pos >= end {
            return None;
        }
        if self.toks[self.pos].is_punct("(") {
            if let Some(close) = self.matching(self.pos) {
                if close + 1 == end {
                    let inner = self.text_between(self.pos + 1, close);
                    self.pos = self.toks.len();
                    return (!inner.is_empty()).then(|| inner.to_string());
                }
            }
        }
        let text = self.rest();
        (!text.is_empty()).then(|| text.to_string())
    }

    fn else_branch(&mut self) -> Option<Statement> {
        self.pos += 1;
        if self.eat_keyword("if") {
            let condition = self.condition()?;
            return Some(Statement::ElseIf { condition });
        }
        self.finish(Statement::Else)
    }

    fn end_block(&mut self) -> Option<Statement> {
        self.pos += 1;
        let closed = if self.eat_keyword("if") {
            Statement::EndIf
        } else if self.eat_keyword("for") {
            Statement::EndFor
        } else if self.eat_keyword("while") {
            Statement::EndWhile
        } else {
            return None;
        };
        self.finish(closed)
    }

    fn for_each(&mut self) -> Option<Statement> {
        self.pos += 1;
        if !self.eat_keyword("each") {
            return None;
        }
        let var = self.ident()?;
        if !self.eat_keyword("in") {
            return None;
        }
        let collection = self.rest();
        if collection.is_empty() {
            return None;
        }
        Some(Statement::ForEach {
            var: var.to_string(),
            collection: collection.to_string(),
        })
    }

    fn bare(&mut self, statement: Statement) -> Option<Statement> {
        self.pos += 1;
        self.finish(statement)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn select(&mut self) -> Option<Statement> {
        self.pos += 1;
        let cardinality = if self.eat_keyword("any") {
            Cardinality::Any
        } else if self.eat_keyword("one") {
            Cardinality::One
        } else if self.eat_keyword("many") {
            Cardinality::Many
        } else {
            return None;
        };
        let var = self.ident()?.to_string();

        if self.eat_keyword("from") {
            if !(self.eat_keyword("instances") && self.eat_keyword("of")) {
                return None;
            }
            let class_ref = self.ident()?.to_string();
            let condition = self.where_clause()?;
            return Some(Statement::SelectFromInstances {
                cardinality,
                var,
                class_ref,
                condition,
            });
        }

        if self.eat_keyword("related") && self.eat_keyword("by") {
            let source = self.ident()?.to_string();
            let hops = self.hops()?;
            if hops.is_empty() {
                return None;
            }
            let condition = self.where_clause()?;
            return Some(Statement::SelectRelated {
                cardinality,
                var,
                source,
                hops,
                condition,
            });
        }

        None
    }

    /// Optional `where <cond>`; `None` signals trailing garbage.
    fn where_clause(&mut self) -> Option<Option<String>> {
        if self.at_end() {
            return Some(None);
        }
        if !self.eat_keyword("where") {
            return None;
        }
        let condition = self.condition()?;
        Some(Some(condition))
    }

    /// `->Class[Rn]` repeated.
    fn hops(&mut self) -> Option<Vec<Hop>> {
        let mut hops = Vec::new();
        while self.eat_punct("->") {
            let class = self.ident()?.to_string();
            if !self.eat_punct("[") {
                return None;
            }
            let rel_id = self.ident()?.to_string();
            // Skip a `.'phrase'` qualifier.
            while !self.eat_punct("]") {
                self.bump()?;
            }
            hops.push(Hop { class, rel_id });
        }
        Some(hops)
    }

    // =========================================================================
    // Instances and links
    // =========================================================================

    fn create(&mut self) -> Option<Statement> {
        self.pos += 1;
        if self.eat_keyword("object") {
            if !self.eat_keyword("instance") {
                return None;
            }
            let var = self.ident()?.to_string();
            if !self.eat_keyword("of") {
                return None;
            }
            let class_ref = self.ident()?.to_string();
            return self.finish(Statement::CreateObject { var, class_ref });
        }

        if self.eat_keyword("event") {
            if !self.eat_keyword("instance") {
                return None;
            }
            let var = self.ident()?.to_string();
            if !self.eat_keyword("of") {
                return None;
            }
            let (key_letters, label, args) = self.event_spec()?;
            if !self.eat_keyword("to") {
                return None;
            }
            let target = self.rest();
            if target.is_empty() {
                return None;
            }
            return Some(Statement::CreateEvent {
                var,
                key_letters,
                label,
                args,
                target: target.to_string(),
            });
        }

        None
    }

    /// `[KL:]Label[(args)]`
    fn event_spec(&mut self) -> Option<(Option<String>, String, Vec<Argument>)> {
        let first = self.ident()?.to_string();
        let (key_letters, label) = if self.eat_punct(":") {
            (Some(first), self.ident()?.to_string())
        } else {
            (None, first)
        };
        let args = if self.peek().is_some_and(|t| t.is_punct("(")) {
            self.arguments()?
        } else {
            Vec::new()
        };
        Some((key_letters, label, args))
    }

    fn delete(&mut self) -> Option<Statement> {
        self.pos += 1;
        if !(self.eat_keyword("object") && self.eat_keyword("instance")) {
            return None;
        }
        let var = self.ident()?.to_string();
        self.finish(Statement::DeleteObject { var })
    }

    fn relate(&mut self) -> Option<Statement> {
        self.pos += 1;
        let source = self.ident()?.to_string();
        if !self.eat_keyword("to") {
            return None;
        }
        let target = self.ident()?.to_string();
        let (rel_id, using) = self.across()?;
        Some(Statement::Relate {
            source,
            target,
            rel_id,
            using,
        })
    }

    fn unrelate(&mut self) -> Option<Statement> {
        self.pos += 1;
        let source = self.ident()?.to_string();
        if !self.eat_keyword("from") {
            return None;
        }
        let target = self.ident()?.to_string();

        if self.peek().is_some_and(|t| t.is_punct("->")) {
            let mut hops = self.hops()?;
            if hops.len() != 1 {
                return None;
            }
            let nav = hops.remove(0);
            let (rel_id, using) = self.across()?;
            if using.is_some() {
                return None;
            }
            return Some(Statement::UnrelateNavigated {
                source,
                nav_source: target,
                nav,
                rel_id,
            });
        }

        let (rel_id, using) = self.across()?;
        Some(Statement::Unrelate {
            source,
            target,
            rel_id,
            using,
        })
    }

    /// `across Rn[.'phrase'] [using x]`
    fn across(&mut self) -> Option<(String, Option<String>)> {
        if !self.eat_keyword("across") {
            return None;
        }
        let rel_id = self.ident()?.to_string();
        if self.eat_punct(".") {
            let phrase = self.bump()?;
            if phrase.kind != TokenKind::Str && phrase.kind != TokenKind::Ident {
                return None;
            }
        }
        let using = if self.eat_keyword("using") {
            Some(self.ident()?.to_string())
        } else {
            None
        };
        if !self.at_end() {
            return None;
        }
        Some((rel_id, using))
    }

    // =========================================================================
    // Events and messages
    // =========================================================================

    fn send(&mut self) -> Option<Statement> {
        self.pos += 1;
        let message = self.ident()?.to_string();
        let args = self.arguments()?;
        if !self.eat_keyword("to") {
            return None;
        }
        let target = self.rest();
        if target.is_empty() {
            return None;
        }
        Some(Statement::Send {
            message,
            args,
            target: target.to_string(),
        })
    }

    fn generate(&mut self) -> Option<Statement> {
        self.pos += 1;
        let is_event_form = self
            .peek_at(1)
            .is_some_and(|t| t.is_punct(":") || t.is_punct("("))
            || self.peek_at(1).is_some_and(|t| t.is_keyword("to"));

        if !is_event_form {
            let var = self.ident()?.to_string();
            return self.finish(Statement::GenerateInstance { var });
        }

        let (key_letters, event, args) = self.event_spec()?;
        if !self.eat_keyword("to") {
            return None;
        }
        let target = self.rest();
        if target.is_empty() {
            return None;
        }
        Some(Statement::Generate {
            key_letters,
            event,
            args,
            target: target.to_string(),
        })
    }

    // =========================================================================
    // Calls and assignment
    // =========================================================================

    fn call_or_assignment(&mut self) -> Option<Statement> {
        let start = self.pos;

        // ::Function(args)
        if self.eat_punct("::") {
            let name = self.ident()?.to_string();
            let args = self.arguments()?;
            return self.finish(Statement::FunctionCall { name, args });
        }

        if let Some(statement) = self.call() {
            return Some(statement);
        }
        self.pos = start;
        self.assignment()
    }

    fn call(&mut self) -> Option<Statement> {
        let head = self.ident()?.to_string();

        if self.eat_punct("::") {
            let operation = self.ident()?.to_string();
            let args = self.arguments()?;
            return self.finish(Statement::BridgeCall {
                entity: head,
                operation,
                args,
            });
        }

        if self.eat_punct(".") {
            let method = self.ident()?.to_string();
            let args = self.arguments()?;
            return self.finish(Statement::MethodCall {
                object: head,
                method,
                args,
            });
        }

        if RESERVED.iter().any(|r| r.eq_ignore_ascii_case(&head)) {
            return None;
        }
        let args = self.arguments()?;
        self.finish(Statement::FunctionCall { name: head, args })
    }

    fn assignment(&mut self) -> Option<Statement> {
        let eq = (self.pos..self.toks.len()).find(|&i| self.toks[i].is_punct("="))?;
        let target = match &self.toks[self.pos..eq] {
            [name] if name.is_ident() => AssignTarget::Local(name.text.to_string()),
            [object, dot, attribute] if object.is_ident() && dot.is_punct(".") && attribute.is_ident() => {
                AssignTarget::Attribute {
                    object: object.text.to_string(),
                    attribute: attribute.text.to_string(),
                }
            }
            _ => return None,
        };
        self.pos = eq + 1;
        let value = self.rest();
        if value.is_empty() {
            return None;
        }
        Some(Statement::Assign {
            target,
            value: value.to_string(),
        })
    }

    /// `( arg, name: value, ... )`
    fn arguments(&mut self) -> Option<Vec<Argument>> {
        let open = self.pos;
        if !self.peek()?.is_punct("(") {
            return None;
        }
        let close = self.matching(open)?;
        let mut args = Vec::new();
        let mut part_start = open + 1;
        let mut depth = 0usize;
        for i in open + 1..=close {
            let tok = &self.toks[i];
            if tok.is_punct("(") || tok.is_punct("[") {
                depth += 1;
            } else if (tok.is_punct(")") || tok.is_punct("]")) && i != close {
                depth = depth.saturating_sub(1);
            }
            if (tok.is_punct(",") && depth == 0) || i == close {
                if let Some(arg) = self.argument(part_start, i) {
                    args.push(arg);
                }
                part_start = i + 1;
            }
        }
        self.pos = close + 1;
        Some(args)
    }

    fn argument(&self, start: usize, end: usize) -> Option<Argument> {
        if start >= end {
            return None;
        }
        let named = end - start > 2 && self.toks[start].is_ident() && self.toks[start + 1].is_punct(":");
        if named {
            return Some(Argument {
                name: Some(self.toks[start].text.to_string()),
                value: self.text_between(start + 2, end).to_string(),
            });
        }
        Some(Argument {
            name: None,
            value: self.text_between(start, end).to_string(),
        })
    }

    // =========================================================================
    // Token plumbing
    // =========================================================================

    fn peek(&self) -> Option<&Token<'a>> {
        self.toks.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token<'a>> {
        self.toks.get(self.pos + offset)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let tok = self.toks.get(self.pos)?.clone();
        self.pos += 1;
        Some(tok)
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_keyword(kw)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(p)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let tok = self.peek()?;
        if !tok.is_ident() {
            return None;
        }
        let text = tok.text;
        self.pos += 1;
        Some(text)
    }

    /// Index one past the last token that is not a trailing `;`.
    fn content_end(&self) -> usize {
        let mut end = self.toks.len();
        while end > self.pos && self.toks[end - 1].is_punct(";") {
            end -= 1;
        }
        end
    }

    fn at_end(&self) -> bool {
        self.pos >= self.content_end()
    }

    fn finish(&mut self, statement: Statement) -> Option<Statement> {
        self.at_end().then_some(statement)
    }

    /// Source text of the remaining tokens, minus trailing `;`.
    fn rest(&mut self) -> &'a str {
        let end = self.content_end();
        let text = self.text_between(self.pos, end);
        self.pos = self.toks.len();
        text
    }

    fn text_between(&self, start: usize, end: usize) -> &'a str {
        if start >= end || end > self.toks.len() {
            return "";
        }
        let from = self.toks[start].span.start;
        let to = self.toks[end - 1].span.end;
        self.src[from..to].trim()
    }

    /// Index of the token closing the group opened at `open`.
    fn matching(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, tok) in self.toks.iter().enumerate().skip(open) {
            if tok.is_punct("(") {
                depth += 1;
            } else if tok.is_punct(")") {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_if_with_parenthesized_condition() {
        assert_eq!(
            parse_line("if (self.balance >= price)"),
            Statement::If { condition: "self.balance >= price".into() }
        );
        assert_eq!(
            parse_line("if (a) and (b)"),
            Statement::If { condition: "(a) and (b)".into() }
        );
        assert_eq!(parse_line("if ()"), Statement::Unrecognized("if ()".into()));
    }

    #[test]
    fn parses_block_keywords() {
        assert_eq!(parse_line("else"), Statement::Else);
        assert_eq!(parse_line("else if (x)"), Statement::ElseIf { condition: "x".into() });
        assert_eq!(parse_line("END IF;"), Statement::EndIf);
        assert_eq!(parse_line("end for"), Statement::EndFor);
        assert_eq!(parse_line("end while;"), Statement::EndWhile);
        assert_eq!(parse_line("break;"), Statement::Break);
        assert_eq!(parse_line("return;"), Statement::Return { value: None });
        assert_eq!(parse_line("return x + 1;"), Statement::Return { value: Some("x + 1".into()) });
    }

    #[test]
    fn parses_for_each() {
        assert_eq!(
            parse_line("for each slot in slots"),
            Statement::ForEach { var: "slot".into(), collection: "slots".into() }
        );
    }

    #[test]
    fn parses_selection_with_where() {
        assert_eq!(
            parse_line("select any p from instances of Product where (selected.price > 5);"),
            Statement::SelectFromInstances {
                cardinality: Cardinality::Any,
                var: "p".into(),
                class_ref: "Product".into(),
                condition: Some("selected.price > 5".into()),
            }
        );
    }

    #[test]
    fn parses_navigation_chain() {
        let stmt = parse_line("select many ps related by self->Slot[R1]->Product[R2.'holds'];");
        assert_eq!(
            stmt,
            Statement::SelectRelated {
                cardinality: Cardinality::Many,
                var: "ps".into(),
                source: "self".into(),
                hops: vec![
                    Hop { class: "Slot".into(), rel_id: "R1".into() },
                    Hop { class: "Product".into(), rel_id: "R2".into() },
                ],
                condition: None,
            }
        );
        assert_eq!(stmt.relationship_ids(), vec!["R1", "R2"]);
    }

    #[test]
    fn parses_lifecycle() {
        assert_eq!(
            parse_line("create object instance p of PRD;"),
            Statement::CreateObject { var: "p".into(), class_ref: "PRD".into() }
        );
        assert_eq!(
            parse_line("delete object instance p;"),
            Statement::DeleteObject { var: "p".into() }
        );
    }

    #[test]
    fn parses_relate_forms() {
        assert_eq!(
            parse_line("relate a to b across R1;"),
            Statement::Relate { source: "a".into(), target: "b".into(), rel_id: "R1".into(), using: None }
        );
        assert_eq!(
            parse_line("relate a to b across R3 using link;"),
            Statement::Relate {
                source: "a".into(),
                target: "b".into(),
                rel_id: "R3".into(),
                using: Some("link".into()),
            }
        );
        assert_eq!(
            parse_line("unrelate a from self->Slot[R1] across R2;"),
            Statement::UnrelateNavigated {
                source: "a".into(),
                nav_source: "self".into(),
                nav: Hop { class: "Slot".into(), rel_id: "R1".into() },
                rel_id: "R2".into(),
            }
        );
    }

    #[test]
    fn parses_generate_forms() {
        assert_eq!(
            parse_line("generate VM:CoinInserted(amount: 5) to self;"),
            Statement::Generate {
                key_letters: Some("VM".into()),
                event: "CoinInserted".into(),
                args: vec![Argument { name: Some("amount".into()), value: "5".into() }],
                target: "self".into(),
            }
        );
        assert_eq!(
            parse_line("generate Reset to machine;"),
            Statement::Generate {
                key_letters: None,
                event: "Reset".into(),
                args: vec![],
                target: "machine".into(),
            }
        );
        assert_eq!(parse_line("generate evt;"), Statement::GenerateInstance { var: "evt".into() });
    }

    #[test]
    fn parses_create_event_and_send() {
        assert_eq!(
            parse_line("create event instance e of VM:Tick() to self;"),
            Statement::CreateEvent {
                var: "e".into(),
                key_letters: Some("VM".into()),
                label: "Tick".into(),
                args: vec![],
                target: "self".into(),
            }
        );
        assert_eq!(
            parse_line("send Notify(msg: \"a, b\", 3) to Display;"),
            Statement::Send {
                message: "Notify".into(),
                args: vec![
                    Argument { name: Some("msg".into()), value: "\"a, b\"".into() },
                    Argument { name: None, value: "3".into() },
                ],
                target: "Display".into(),
            }
        );
    }

    #[test]
    fn parses_calls() {
        assert_eq!(
            parse_line("LOG::LogInfo(message: \"hi\");"),
            Statement::BridgeCall {
                entity: "LOG".into(),
                operation: "LogInfo".into(),
                args: vec![Argument { name: Some("message".into()), value: "\"hi\"".into() }],
            }
        );
        assert_eq!(
            parse_line("restock(count: 2);"),
            Statement::FunctionCall {
                name: "restock".into(),
                args: vec![Argument { name: Some("count".into()), value: "2".into() }],
            }
        );
        assert_eq!(
            parse_line("::restock();"),
            Statement::FunctionCall { name: "restock".into(), args: vec![] }
        );
        assert_eq!(
            parse_line("self.refund(amount: 1);"),
            Statement::MethodCall {
                object: "self".into(),
                method: "refund".into(),
                args: vec![Argument { name: Some("amount".into()), value: "1".into() }],
            }
        );
        assert_eq!(parse_line("print(\"x\");"), Statement::Unrecognized("print(\"x\");".into()));
    }

    #[test]
    fn parses_assignments() {
        assert_eq!(
            parse_line("self.balance = self.balance + rcvd_evt.amount;"),
            Statement::Assign {
                target: AssignTarget::Attribute { object: "self".into(), attribute: "balance".into() },
                value: "self.balance + rcvd_evt.amount".into(),
            }
        );
        assert_eq!(
            parse_line("assign total = 0"),
            Statement::Assign { target: AssignTarget::Local("total".into()), value: "0".into() }
        );
        assert_eq!(
            parse_line("ok = a == b;"),
            Statement::Assign { target: AssignTarget::Local("ok".into()), value: "a == b".into() }
        );
    }

    #[test]
    fn unknown_lines_are_kept_verbatim() {
        assert_eq!(
            parse_line("frobnicate the widget"),
            Statement::Unrecognized("frobnicate the widget".into())
        );
    }

    #[test]
    fn body_tracks_line_numbers_and_block_comments() {
        let body = "x = 1;\n\n/* start\nstill comment\nend */\ny = 2;";
        let parsed = parse_body(body);
        let numbers: Vec<usize> = parsed.iter().map(|p| p.line_no).collect();
        assert_eq!(numbers, vec![1, 3, 4, 5, 6]);
        assert!(matches!(parsed[2].statement, Statement::Comment(ref c) if c == "still comment"));
        assert!(matches!(parsed[4].statement, Statement::Assign { .. }));
    }

    #[test]
    fn comment_markers_are_stripped() {
        assert_eq!(parse_line("// dispense"), Statement::Comment("dispense".into()));
        assert_eq!(parse_line("# note"), Statement::Comment("note".into()));
        assert_eq!(parse_line("/* inline */"), Statement::Comment("inline".into()));
    }
}
