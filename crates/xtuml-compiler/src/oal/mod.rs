//! Object Action Language: tokenizer, statement parser and the translators
//! that turn action bodies into Python.

pub mod ast;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod symbols;
pub mod translate;

pub use ast::Statement;
pub use expr::{translate_expression, ExprTranslator};
pub use parser::{parse_body, parse_line};
pub use symbols::{Scope, SymbolTable};
pub use translate::{ActionContext, ActionTranslator, Translation};

/// Where an action body runs. Selects what `self` and the implicit
/// arguments refer to in the emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// Class operation: `self` is the receiving instance.
    Operation,
    /// State entry action: `self` is the state machine owner.
    StateAction,
    /// Domain function: no instance in scope.
    Function,
}
