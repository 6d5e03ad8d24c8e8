//! Line-by-line lint of action bodies.
//!
//! Uses the same statement parser as the translator, so a line that lints
//! clean is a line the translator understands.

use serde_json::Value;

use crate::diagnostic::ValidationIssue;
use crate::frontend::document::{self as doc};
use crate::oal::ast::Statement;
use crate::oal::parse_body;

use super::References;

/// Lints every state action, operation action and function action.
pub fn lint_document(document: &Value, refs: &References, issues: &mut Vec<ValidationIssue>) {
    for (idx, class) in doc::classes(document).iter().enumerate() {
        for (s_idx, state) in doc::array(class, "states").iter().enumerate() {
            let action = doc::action_text(state.get("action"));
            lint_action(
                &action,
                &format!("classes[{}].states[{}].action", idx, s_idx),
                refs,
                issues,
            );
        }
        for (o_idx, op) in doc::array(class, "operations").iter().enumerate() {
            let action = doc::action_text(op.get("action"));
            lint_action(
                &action,
                &format!("classes[{}].operations[{}].action", idx, o_idx),
                refs,
                issues,
            );
        }
    }

    for (idx, function) in doc::array(document, "functions").iter().enumerate() {
        let action = doc::action_text(function.get("action"));
        lint_action(&action, &format!("functions[{}].action", idx), refs, issues);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    If,
    For,
    While,
}

impl Block {
    fn keyword(self) -> &'static str {
        match self {
            Block::If => "if",
            Block::For => "for each",
            Block::While => "while",
        }
    }

    fn closer(self) -> &'static str {
        match self {
            Block::If => "end if",
            Block::For => "end for",
            Block::While => "end while",
        }
    }
}

/// Lints one action body. Issue paths are `<path>.line<N>`, N counting
/// raw lines from 1.
pub fn lint_action(body: &str, path: &str, refs: &References, issues: &mut Vec<ValidationIssue>) {
    let mut open: Vec<(Block, usize)> = Vec::new();

    for line in parse_body(body) {
        let at = format!("{}.line{}", path, line.line_no);

        match &line.statement {
            Statement::Unrecognized(text) => {
                issues.push(
                    ValidationIssue::new(&at, format!("Unrecognized OAL statement: '{}'", text))
                        .with_hint("Check the line for typos or an unsupported statement form"),
                );
                continue;
            }
            Statement::SelectFromInstances { class_ref, .. } => {
                if !refs.has_class(class_ref) {
                    issues.push(
                        ValidationIssue::new(
                            &at,
                            format!("Unknown class reference '{}' in selection", class_ref),
                        )
                        .with_hint("Check the spelling of the class name or key letters"),
                    );
                }
            }
            Statement::CreateObject { class_ref, .. } => {
                if !refs.has_class(class_ref) {
                    issues.push(
                        ValidationIssue::new(&at, format!("Unknown class '{}' in create instance", class_ref))
                            .with_hint("Use the key letters or name of a declared class"),
                    );
                }
            }
            Statement::Generate { event, .. } => {
                if !refs.has_event(event) {
                    issues.push(
                        ValidationIssue::new(&at, format!("Event '{}' is not defined in events", event))
                            .with_hint("Add it to the events block or fix the spelling"),
                    );
                }
            }
            _ => {}
        }

        for rel_id in line.statement.relationship_ids() {
            if !refs.has_relationship(rel_id) {
                issues.push(
                    ValidationIssue::new(&at, format!("Unknown relationship '{}'", rel_id))
                        .with_hint("The rel_id must be declared in relationships"),
                );
            }
        }

        check_block(&line.statement, line.line_no, &at, &mut open, issues);
    }

    for (block, line_no) in open {
        issues.push(
            ValidationIssue::new(
                format!("{}.line{}", path, line_no),
                format!("'{}' block is never closed", block.keyword()),
            )
            .with_hint(format!("Add '{}'", block.closer())),
        );
    }
}

fn check_block(
    statement: &Statement,
    line_no: usize,
    at: &str,
    open: &mut Vec<(Block, usize)>,
    issues: &mut Vec<ValidationIssue>,
) {
    let (closing, label) = match statement {
        Statement::If { .. } => {
            open.push((Block::If, line_no));
            return;
        }
        Statement::ForEach { .. } => {
            open.push((Block::For, line_no));
            return;
        }
        Statement::While { .. } => {
            open.push((Block::While, line_no));
            return;
        }
        Statement::ElseIf { .. } | Statement::Else => {
            if !matches!(open.last(), Some((Block::If, _))) {
                let label = if matches!(statement, Statement::Else) { "else" } else { "elif" };
                issues.push(
                    ValidationIssue::new(at, format!("'{}' outside an if block", label))
                        .with_hint("Open the branch with 'if (condition)' first"),
                );
            }
            return;
        }
        Statement::EndIf => (Block::If, "end if"),
        Statement::EndFor => (Block::For, "end for"),
        Statement::EndWhile => (Block::While, "end while"),
        _ => return,
    };

    match open.last().copied() {
        Some((block, _)) if block == closing => {
            open.pop();
        }
        Some((block, opened)) => {
            issues.push(
                ValidationIssue::new(
                    at,
                    format!("'{}' does not match the '{}' opened on line {}", label, block.keyword(), opened),
                )
                .with_hint(format!("Close the inner block with '{}' first", block.closer())),
            );
            open.pop();
        }
        None => issues.push(
            ValidationIssue::new(at, format!("'{}' without a matching '{}'", label, closing.keyword()))
                .with_hint("Remove the line or open the block it closes"),
        ),
    }
}
