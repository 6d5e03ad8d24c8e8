//! Python code generation from the normalized model.
//!
//! Produces a self-contained Python project:
//! - `runtime/` (embedded support modules)
//! - `models/` (one module per class and association class, plus the index)
//! - `functions.py` (when the model declares functions)
//! - `app.py` (entry point with demo data)

mod association;
mod class;
mod project;
pub mod py_types;
mod runtime;

use std::collections::BTreeMap;

use crate::diagnostic::TranslationNote;
use crate::ir::Model;
use crate::oal::{ActionTranslator, SymbolTable};

pub use class::event_states;
pub use runtime::get_runtime_modules;

/// A single generated module and the notes raised while translating the
/// action code inlined into it.
#[derive(Debug, Clone, Default)]
pub struct GeneratedModule {
    pub code: String,
    pub notes: Vec<TranslationNote>,
}

/// Generated Python code.
#[derive(Debug, Clone, Default)]
pub struct GeneratedCode {
    /// Map of relative path to content.
    pub files: BTreeMap<String, String>,
    /// Translation notes in generation order.
    pub warnings: Vec<TranslationNote>,
}

impl GeneratedCode {
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Notes that name a symbol the compiler could not resolve.
    pub fn unresolved(&self) -> impl Iterator<Item = &TranslationNote> {
        self.warnings.iter().filter(|n| n.kind.is_unresolved())
    }

    /// Every file concatenated under a path banner: runtime modules first,
    /// then `models/`, then the remaining files, `app.py` last.
    pub fn combined_preview(&self) -> String {
        let mut order: Vec<&str> = get_runtime_modules()
            .into_iter()
            .map(|(path, _)| path)
            .filter(|path| self.files.contains_key(*path))
            .collect();
        order.extend(
            self.files
                .keys()
                .map(String::as_str)
                .filter(|p| p.starts_with("models/")),
        );
        order.extend(self.files.keys().map(String::as_str).filter(|p| {
            !p.starts_with("runtime/") && !p.starts_with("models/") && *p != "app.py"
        }));
        if self.files.contains_key("app.py") {
            order.push("app.py");
        }

        let mut preview = String::new();
        for path in order {
            preview.push_str(&format!("# {}\n# {}\n# {}\n", "=".repeat(70), path, "=".repeat(70)));
            preview.push_str(&self.files[path]);
            if !preview.ends_with('\n') {
                preview.push('\n');
            }
            preview.push('\n');
        }
        preview
    }
}

/// Generates the Python project for a model.
pub fn generate(model: &Model) -> GeneratedCode {
    let symbols = SymbolTable::from_model(model);
    let translator = ActionTranslator::new(&symbols);
    let mut out = GeneratedCode::default();

    // Runtime support modules
    for (path, content) in get_runtime_modules() {
        out.files.insert(path.to_string(), content.to_string());
    }

    // One module per class
    for id in model.class_ids() {
        let class = model.class(id);
        let module = class::generate_class(model, id, &translator);
        out.warnings.extend(module.notes);
        out.files
            .insert(format!("models/{}.py", class.py_name), module.code);
    }

    // Association classes of many-to-many relationships
    for assoc in &model.association_classes {
        out.files.insert(
            format!("models/{}.py", assoc.py_name),
            association::generate_association(model, assoc),
        );
    }

    out.files.insert(
        "models/__init__.py".to_string(),
        project::generate_models_index(model),
    );

    if model.has_functions() {
        let module = project::generate_functions(model, &translator);
        out.warnings.extend(module.notes);
        out.files.insert("functions.py".to_string(), module.code);
    }

    out.files
        .insert("app.py".to_string(), project::generate_app(model));

    tracing::debug!(
        files = out.files.len(),
        warnings = out.warnings.len(),
        "generated python project"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::normalize;
    use serde_json::json;

    fn make_test_model() -> Model {
        normalize(&json!({
            "sub_name": "school",
            "model": [
                {"class_id": "C1", "class_name": "Student", "KL": "STU",
                 "operations": [{"signature": "enroll()", "action": "x = self.nickname;"}]},
                {"class_id": "C2", "class_name": "Course", "KL": "CRS"}
            ],
            "relationships": [
                {"rel_id": "R1", "from_class": "STU", "to_class": "CRS",
                 "from_class_multiplicity": "*", "to_class_multiplicity": "*"}
            ],
            "functions": [{"name": "report", "action": "LOG::LogInfo(message: \"ok\");"}]
        }))
    }

    #[test]
    fn test_generates_every_file() {
        let code = generate(&make_test_model());
        let paths: Vec<&str> = code.files.keys().map(String::as_str).collect();
        for expected in [
            "runtime/__init__.py",
            "runtime/state_machine.py",
            "models/Student.py",
            "models/Course.py",
            "models/Student_Course_R1.py",
            "models/__init__.py",
            "functions.py",
            "app.py",
        ] {
            assert!(paths.contains(&expected), "missing {expected}: {paths:?}");
        }
        assert_eq!(code.file_count(), 6 + 6);
    }

    #[test]
    fn test_collects_translation_notes() {
        let code = generate(&make_test_model());
        assert_eq!(code.warnings.len(), 1, "{:?}", code.warnings);
        assert_eq!(code.warnings[0].location, "Student.enroll.line1");
        assert_eq!(code.unresolved().count(), 1);
    }

    #[test]
    fn test_combined_preview_order() {
        let preview = generate(&make_test_model()).combined_preview();
        let at = |path: &str| preview.find(&format!("# {}\n", path)).unwrap();

        assert!(at("runtime/__init__.py") < at("runtime/base.py"));
        assert!(at("runtime/services.py") < at("models/Course.py"));
        assert!(at("models/__init__.py") < at("functions.py"));
        assert!(at("functions.py") < at("app.py"));
        assert!(preview.trim_end().ends_with("print(\"Available instances:\", list(instances.keys()))"));
    }
}
