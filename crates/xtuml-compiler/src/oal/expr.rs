//! Expression rewriting from OAL to Python.
//!
//! Works on the token stream of a fragment, so string literals are never
//! touched. The rewrite rules run in a fixed order per token: temporal
//! keywords, duration literals, emptiness tests, member access, boolean
//! keywords. Trailing statement terminators are dropped before any of it.

use crate::diagnostic::{NoteKind, TranslationNote};

use super::lexer::{tokenize, Token, TokenKind};
use super::symbols::{Scope, SymbolTable};
use super::ContextKind;

/// Receivers whose members are passed through untouched.
const IGNORED_RECEIVERS: &[&str] = &[
    "payload",
    "candidate",
    "ObjectStore",
    "RuntimeServices",
    "owner",
    "self",
    "kwargs",
    "time",
    "uuid",
    "datetime",
    "rt",
    "math",
];

/// Duration units and their length in seconds.
const DURATION_UNITS: &[(&str, u32)] = &[
    ("hour", 3600),
    ("hours", 3600),
    ("minute", 60),
    ("minutes", 60),
    ("sec", 1),
    ("secs", 1),
    ("second", 1),
    ("seconds", 1),
    ("day", 86400),
    ("days", 86400),
];

/// Translates a fragment without model knowledge.
pub fn translate_expression(expr: &str, context: ContextKind) -> String {
    let symbols = SymbolTable::default();
    let scope = Scope::new(&symbols, context, None);
    ExprTranslator::new(&scope).translate(expr)
}

/// Rewrites expressions against a [`Scope`], collecting notes for member
/// accesses it could not resolve.
pub struct ExprTranslator<'a, 's> {
    scope: &'a Scope<'s>,
    notes: Vec<TranslationNote>,
}

impl<'a, 's> ExprTranslator<'a, 's> {
    pub fn new(scope: &'a Scope<'s>) -> Self {
        Self {
            scope,
            notes: Vec::new(),
        }
    }

    pub fn into_notes(self) -> Vec<TranslationNote> {
        self.notes
    }

    pub fn translate(&mut self, expr: &str) -> String {
        let tokens = strip_terminators(tokenize(expr.trim()));
        let mut out = String::new();
        let mut i = 0;

        while i < tokens.len() {
            let tok = &tokens[i];
            match tok.kind {
                TokenKind::Number => {
                    i = self.number(&tokens, i, &mut out);
                }
                TokenKind::Ident => {
                    i = self.ident(&tokens, i, &mut out);
                }
                TokenKind::Punct if tok.is_punct("::") => {
                    i = self.function_call(&tokens, i, &mut out);
                }
                _ => {
                    out.push_str(tok.text);
                    i += 1;
                }
            }
        }

        out
    }

    fn number(&mut self, tokens: &[Token<'_>], i: usize, out: &mut String) -> usize {
        let value = tokens[i].text;
        let mut j = i + 1;
        if tokens.get(j).is_some_and(|t| t.is_trivia()) {
            j += 1;
        }
        if let Some(unit) = tokens.get(j).filter(|t| t.is_ident()) {
            let lower = unit.text.to_ascii_lowercase();
            if let Some((_, secs)) = DURATION_UNITS.iter().find(|(name, _)| *name == lower) {
                out.push_str(&format!("({} * {})", value, secs));
                return j + 1;
            }
        }
        out.push_str(value);
        i + 1
    }

    fn ident(&mut self, tokens: &[Token<'_>], i: usize, out: &mut String) -> usize {
        let tok = &tokens[i];
        let lower = tok.text.to_ascii_lowercase();

        // Temporal keywords, with an optional empty call suffix.
        let temporal = match lower.as_str() {
            "currenttimestamp" | "currenttime" => Some("rt.services.current_timestamp()"),
            "currentdate" => Some("rt.services.current_date()"),
            _ => None,
        };
        if let Some(replacement) = temporal {
            out.push_str(replacement);
            let mut j = i + 1;
            if tokens.get(j).is_some_and(|t| t.is_punct("("))
                && tokens.get(j + 1).is_some_and(|t| t.is_punct(")"))
            {
                j += 2;
            }
            return j;
        }

        // Emptiness tests.
        if matches!(lower.as_str(), "not_empty" | "empty" | "cardinality") {
            if let Some((operand, next)) = operand_after(tokens, i + 1) {
                let operand = self.translate(&operand);
                let rewritten = match lower.as_str() {
                    "not_empty" => format!("{} is not None", operand),
                    "empty" => format!("{} is None", operand),
                    _ => format!("len({0} if {0} else [])", operand),
                };
                out.push_str(&rewritten);
                return next;
            }
        }

        // EE::op(args)
        if tokens.get(i + 1).is_some_and(|t| t.is_punct("::"))
            && tokens.get(i + 2).is_some_and(|t| t.is_ident())
            && tokens.get(i + 3).is_some_and(|t| t.is_punct("("))
        {
            if let Some(close) = matching_paren(tokens, i + 3) {
                let args = self.call_arguments(&tokens[i + 4..close]);
                let mut call = format!("rt.bridge('{}', '{}'", tok.text, tokens[i + 2].text);
                for arg in args {
                    call.push_str(", ");
                    call.push_str(&arg);
                }
                call.push(')');
                out.push_str(&call);
                return close + 1;
            }
        }

        // Member access.
        if tokens.get(i + 1).is_some_and(|t| t.is_punct("."))
            && tokens.get(i + 2).is_some_and(|t| t.is_ident())
        {
            return self.member(tokens, i, out);
        }

        let replacement = match lower.as_str() {
            "and" | "or" | "not" => lower.clone(),
            "true" => "True".to_string(),
            "false" => "False".to_string(),
            _ => match tok.text {
                "self" => self.scope.owner_expr().to_string(),
                "rcvd_evt" => "payload".to_string(),
                "param" => "kwargs".to_string(),
                "selected" => "candidate".to_string(),
                text if self.scope.is_candidate(text) => "candidate".to_string(),
                text => text.to_string(),
            },
        };
        out.push_str(&replacement);
        i + 1
    }

    /// `::name(args)` inside an expression.
    fn function_call(&mut self, tokens: &[Token<'_>], i: usize, out: &mut String) -> usize {
        let is_call = tokens.get(i + 1).is_some_and(|t| t.is_ident())
            && tokens.get(i + 2).is_some_and(|t| t.is_punct("("));
        if let (true, Some(close)) = (is_call, matching_paren(tokens, i + 2)) {
            let args = self.call_arguments(&tokens[i + 3..close]);
            let mut call = format!("rt.call_function('{}'", tokens[i + 1].text);
            for arg in args {
                call.push_str(", ");
                call.push_str(&arg);
            }
            call.push(')');
            out.push_str(&call);
            return close + 1;
        }
        out.push_str(tokens[i].text);
        i + 1
    }

    /// `head.field[.field...]`
    fn member(&mut self, tokens: &[Token<'_>], i: usize, out: &mut String) -> usize {
        let head = tokens[i].text;
        let field = tokens[i + 2].text;
        let is_call = is_call_at(tokens, i + 3);
        let mut next = i + 3;
        let mut verbatim = false;

        let mut text = match head {
            "rcvd_evt" => format!("payload.get('{}')", field),
            "param" => format!("kwargs.get('{}')", field),
            _ if self.scope.is_candidate(head) => {
                self.check_member(head, field, is_call);
                access("candidate", field, is_call)
            }
            "self" => {
                self.check_member(head, field, is_call);
                access(self.scope.owner_expr(), field, is_call)
            }
            _ if IGNORED_RECEIVERS.contains(&head) || is_runtime_member(field) => {
                verbatim = true;
                format!("{}.{}", head, field)
            }
            _ if is_call => format!("{}.{}", head, field),
            _ => match self.scope.class_of(head) {
                Some(class) if class.has_operation(field) => format!("{}.{}", head, field),
                Some(_) => {
                    self.check_member(head, field, false);
                    access(head, field, false)
                }
                None => {
                    self.notes.push(TranslationNote::new(
                        "",
                        NoteKind::UnresolvedReceiver,
                        format!("'{}.{}' read as an attribute; the class of '{}' is not known", head, field, head),
                    ));
                    access(head, field, false)
                }
            },
        };

        // Further `.field` steps read attributes of the previous result.
        while tokens.get(next).is_some_and(|t| t.is_punct("."))
            && tokens.get(next + 1).is_some_and(|t| t.is_ident())
        {
            let step = tokens[next + 1].text;
            let step_call = is_call_at(tokens, next + 2);
            if verbatim || step_call || is_runtime_member(step) {
                text = format!("{}.{}", text, step);
            } else {
                text = format!("{}.get_attr('{}')", text, step);
            }
            next += 2;
        }

        out.push_str(&text);
        next
    }

    /// Records a note when `receiver` has a known class without attribute
    /// `field`. Used for assignment targets.
    pub fn check_attribute(&mut self, receiver: &str, field: &str) {
        self.check_member(receiver, field, false);
    }

    fn check_member(&mut self, receiver: &str, field: &str, is_call: bool) {
        if is_runtime_member(field) {
            return;
        }
        let Some(class) = self.scope.class_of(receiver) else {
            return;
        };
        let known = if is_call {
            class.has_operation(field)
        } else {
            class.has_attribute(field) || class.has_operation(field)
        };
        if !known {
            let what = if is_call { "operation" } else { "attribute" };
            self.notes.push(TranslationNote::new(
                "",
                NoteKind::UnknownMember,
                format!("class '{}' has no {} '{}'", class.name, what, field),
            ));
        }
    }

    /// Splits call arguments at top-level commas; `name: value` becomes
    /// a keyword argument.
    fn call_arguments(&mut self, tokens: &[Token<'_>]) -> Vec<String> {
        split_top_level(tokens)
            .into_iter()
            .filter_map(|part| {
                let significant: Vec<&Token<'_>> = part.iter().filter(|t| !t.is_trivia()).collect();
                if significant.is_empty() {
                    return None;
                }
                let named = significant.len() > 2
                    && significant[0].is_ident()
                    && significant[1].is_punct(":");
                if named {
                    let value_start = significant[2].span.start;
                    let value_end = significant[significant.len() - 1].span.end;
                    let value = source_between(part, value_start, value_end);
                    Some(format!("{}={}", significant[0].text, self.translate(&value)))
                } else {
                    let text: String = part.iter().map(|t| t.text).collect();
                    Some(self.translate(&text))
                }
            })
            .collect()
    }
}

fn access(receiver: &str, field: &str, is_call: bool) -> String {
    if is_call {
        format!("{}.{}", receiver, field)
    } else {
        format!("{}.get_attr('{}')", receiver, field)
    }
}

/// Members that belong to the generated runtime, not to the model.
fn is_runtime_member(field: &str) -> bool {
    field.starts_with("get_attr")
        || field.starts_with("set_attr")
        || field.starts_with('_')
        || field == "sm"
        || field == "dispatch_event"
}

fn is_call_at(tokens: &[Token<'_>], idx: usize) -> bool {
    tokens.get(idx).is_some_and(|t| t.is_punct("("))
}

/// `X` or `X.y.z` after optional whitespace; returns its text and the index
/// after it.
fn operand_after(tokens: &[Token<'_>], start: usize) -> Option<(String, usize)> {
    let mut j = start;
    if !tokens.get(j).is_some_and(|t| t.is_trivia()) {
        return None;
    }
    j += 1;
    if !tokens.get(j).is_some_and(|t| t.is_ident()) {
        return None;
    }
    let mut text = tokens[j].text.to_string();
    j += 1;
    while tokens.get(j).is_some_and(|t| t.is_punct("."))
        && tokens.get(j + 1).is_some_and(|t| t.is_ident())
    {
        text.push('.');
        text.push_str(tokens[j + 1].text);
        j += 2;
    }
    Some((text, j))
}

fn matching_paren(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        if tok.is_punct("(") {
            depth += 1;
        } else if tok.is_punct(")") {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn split_top_level<'t, 'a>(tokens: &'t [Token<'a>]) -> Vec<&'t [Token<'a>]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        if tok.is_punct("(") || tok.is_punct("[") {
            depth += 1;
        } else if tok.is_punct(")") || tok.is_punct("]") {
            depth = depth.saturating_sub(1);
        } else if tok.is_punct(",") && depth == 0 {
            parts.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    if start < tokens.len() {
        parts.push(&tokens[start..]);
    }
    parts
}

/// Concatenates the text of `part` tokens whose spans fall in `[start, end)`.
fn source_between(part: &[Token<'_>], start: usize, end: usize) -> String {
    part.iter()
        .filter(|t| t.span.start >= start && t.span.end <= end)
        .map(|t| t.text)
        .collect()
}

/// Drops trailing `;` and a trailing `)` left unbalanced by it.
fn strip_terminators(mut tokens: Vec<Token<'_>>) -> Vec<Token<'_>> {
    let trim_trailing = |tokens: &mut Vec<Token<'_>>| {
        while tokens.last().is_some_and(|t| t.is_trivia()) {
            tokens.pop();
        }
    };

    trim_trailing(&mut tokens);
    let mut stripped_semicolon = false;
    while tokens.last().is_some_and(|t| t.is_punct(";")) {
        tokens.pop();
        stripped_semicolon = true;
        trim_trailing(&mut tokens);
    }

    if stripped_semicolon && tokens.last().is_some_and(|t| t.is_punct(")")) {
        let balance: i64 = tokens
            .iter()
            .map(|t| {
                if t.is_punct("(") {
                    1
                } else if t.is_punct(")") {
                    -1
                } else {
                    0
                }
            })
            .sum();
        if balance < 0 {
            tokens.pop();
            trim_trailing(&mut tokens);
        }
    }

    tokens
}
