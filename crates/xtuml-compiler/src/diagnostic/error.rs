//! Compiler error types.
#![allow(unused_assignments)]

use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use super::{TranslationNote, ValidationIssue};

/// Errors that can occur during compilation.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum CompilerError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("I/O failure on '{}': {message}", path.display())]
    #[diagnostic(code(xtuml::io::failed))]
    IoError {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Invalid JSON in '{}' at {line}:{column}: {message}", path.display())]
    #[diagnostic(
        code(xtuml::input::invalid_json),
        help("The model document must be a single JSON object")
    )]
    InvalidJson {
        path: PathBuf,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("No model documents found in '{}'", dir.display())]
    #[diagnostic(
        code(xtuml::input::no_models),
        help("Point the compiler at a .json model file or a directory containing some")
    )]
    NoModels {
        dir: PathBuf,
    },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Model validation failed with {} issue(s)", issues.len())]
    #[diagnostic(
        code(xtuml::validate::failed),
        help("Code is only generated from a model that passes validation")
    )]
    ValidationFailed {
        #[related]
        issues: Vec<ValidationIssue>,
    },

    // =========================================================================
    // Code Generation Errors
    // =========================================================================
    #[error("{} unresolved reference(s) in action code", notes.len())]
    #[diagnostic(
        code(xtuml::codegen::unresolved),
        help("Declare the attribute or class, or compile without --strict to accept late binding")
    )]
    StrictSymbols {
        #[related]
        notes: Vec<TranslationNote>,
    },
}

impl CompilerError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The validation issues carried by this error, if any.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::ValidationFailed { issues } => issues,
            _ => &[],
        }
    }
}
