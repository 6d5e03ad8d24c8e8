//! Accumulated, non-fatal diagnostics.
//!
//! Validation never stops at the first problem: every rule appends a
//! [`ValidationIssue`] and the caller decides whether the list is fatal.
//! Code generation records [`TranslationNote`]s for action code it could
//! only translate heuristically.
#![allow(unused_assignments)]

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/// One validation finding, located by a JSON-ish path into the document
/// (for example `classes[2].states[0].action.line3`).
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("[{path}] {message}")]
#[diagnostic(code(xtuml::validate::issue))]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    #[help]
    pub hint: Option<String>,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// What a translation note is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// `obj.field` where the class of `obj` is known but has no such member.
    UnknownMember,
    /// `obj.field` where the class of `obj` could not be determined.
    UnresolvedReceiver,
    /// A class reference that only resolves at run time.
    LateBoundClass,
    /// A line the translator emitted as an `Unparsed OAL` comment.
    Unparsed,
}

impl NoteKind {
    /// Notes that `--strict` turns into a hard failure.
    pub fn is_unresolved(self) -> bool {
        matches!(self, NoteKind::UnknownMember | NoteKind::LateBoundClass)
    }
}

/// A warning produced while translating action code.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("[{location}] {message}")]
#[diagnostic(code(xtuml::codegen::translation_note), severity(Warning))]
pub struct TranslationNote {
    pub location: String,
    pub kind: NoteKind,
    pub message: String,
}

impl TranslationNote {
    pub fn new(location: impl Into<String>, kind: NoteKind, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            kind,
            message: message.into(),
        }
    }

    /// Re-roots the location under a parent path.
    pub fn under(mut self, parent: &str) -> Self {
        self.location = if self.location.is_empty() {
            parent.to_string()
        } else {
            format!("{}.{}", parent, self.location)
        };
        self
    }
}
