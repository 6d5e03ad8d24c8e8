//! Diagnostic types for error reporting.

mod error;
mod issue;
mod span;

pub use error::CompilerError;
pub use issue::{NoteKind, TranslationNote, ValidationIssue};
pub use span::Span;
