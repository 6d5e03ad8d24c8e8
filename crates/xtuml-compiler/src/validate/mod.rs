//! Validation of model documents.
//!
//! Runs on the raw JSON before normalization and collects every issue it
//! finds, so one report covers the whole document.

mod lint;
mod structure;

use std::collections::HashSet;

use serde_json::Value;

use crate::diagnostic::{CompilerError, ValidationIssue};

pub use lint::lint_action;

/// Names action code may refer to, all lowercased.
#[derive(Debug, Clone, Default)]
pub struct References {
    pub classes: HashSet<String>,
    pub relationships: HashSet<String>,
    pub events: HashSet<String>,
}

impl References {
    pub fn has_class(&self, reference: &str) -> bool {
        self.classes.contains(&reference.trim().to_lowercase())
    }

    pub fn has_relationship(&self, rel_id: &str) -> bool {
        self.relationships.contains(&rel_id.trim().to_lowercase())
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.events.contains(&name.trim().to_lowercase())
    }
}

/// Validates a model document.
pub fn validate(document: &Value) -> Result<(), CompilerError> {
    let issues = collect_issues(document);
    if issues.is_empty() {
        tracing::debug!("model document passed validation");
        return Ok(());
    }
    tracing::debug!(issues = issues.len(), "model document failed validation");
    Err(CompilerError::ValidationFailed { issues })
}

/// Every issue in the document, in document order per check.
pub fn collect_issues(document: &Value) -> Vec<ValidationIssue> {
    let shape = structure::check_shape(document);
    if !shape.is_empty() {
        return shape;
    }

    let (mut issues, refs) = structure::StructureChecker::new(document).run();
    lint::lint_document(document, &refs, &mut issues);
    issues
}
