//! # xtUML Compiler
//!
//! This crate compiles an executable UML model, given as a JSON document,
//! into a runnable Python object system. Class operations, state actions
//! and domain functions written in OAL (Object Action Language) are
//! translated into Python method bodies.
//!
//! ## Architecture
//!
//! ```text
//! Model Document (JSON)
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Validate   │  Structure, references, OAL lint
//! │  (raw JSON)  │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │  Normalize   │  Field aliases, generalizations,
//! │ (JSON → IR)  │  association classes
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Codegen    │  Python classes, runtime package,
//! │  (IR → Py)   │  OAL → Python translation
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xtuml_compiler::{Compiler, CompilerConfig};
//!
//! let config = CompilerConfig {
//!     input: "models/vending.json".into(),
//!     out_dir: "generated".into(),
//!     model_name: None,
//!     strict_symbols: false,
//! };
//!
//! let compiler = Compiler::new(config);
//! compiler.compile()?;
//! ```

pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod frontend;
pub mod ir;
pub mod oal;
pub mod validate;

use std::path::{Path, PathBuf};

use serde_json::Value;

pub use codegen::GeneratedCode;
pub use config::CompilerConfig;
pub use diagnostic::{CompilerError, NoteKind, TranslationNote, ValidationIssue};

/// Validates, normalizes and generates code for one model document.
pub fn compile_document(document: &Value) -> Result<GeneratedCode, CompilerError> {
    validate::validate(document)?;
    let model = frontend::normalize(document);
    Ok(codegen::generate(&model))
}

/// The main compiler struct that orchestrates the compilation pipeline.
pub struct Compiler {
    config: CompilerConfig,
}

/// Code generated for one input document.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    /// The model document.
    pub source: PathBuf,
    /// Where the project is written.
    pub out_dir: PathBuf,
    pub code: GeneratedCode,
}

/// Summary of a compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileResult {
    /// Number of model documents compiled.
    pub models: usize,
    /// Number of files written across all models.
    pub files: usize,
    /// Translation notes across all models.
    pub warnings: Vec<TranslationNote>,
    /// Output directory per model.
    pub outputs: Vec<PathBuf>,
}

impl Compiler {
    /// Creates a new compiler with the given configuration.
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles every input document and writes the generated projects.
    ///
    /// This runs the full pipeline per document:
    /// 1. Load and parse the JSON document
    /// 2. Validate it, collecting every issue
    /// 3. Normalize it into the model IR
    /// 4. Generate Python code
    /// 5. Write output files
    pub fn compile(&self) -> Result<CompileResult, CompilerError> {
        let compiled = self.build()?;
        self.write(&compiled)
    }

    /// Writes projects produced by [`Compiler::build`].
    pub fn write(&self, compiled: &[CompiledModel]) -> Result<CompileResult, CompilerError> {
        let mut result = CompileResult::default();

        for model in compiled {
            self.write_output(&model.out_dir, &model.code)?;
            result.models += 1;
            result.files += model.code.file_count();
            result.warnings.extend(model.code.warnings.iter().cloned());
            result.outputs.push(model.out_dir.clone());
        }

        Ok(result)
    }

    /// Generates code for every input document without writing anything.
    pub fn build(&self) -> Result<Vec<CompiledModel>, CompilerError> {
        let mut compiled = Vec::new();
        for (source, out_dir) in self.inputs()? {
            tracing::debug!(source = %source.display(), "compiling model");
            let document = frontend::load_document(&source)?;
            let code = self.generate_document(&document)?;
            compiled.push(CompiledModel {
                source,
                out_dir,
                code,
            });
        }
        Ok(compiled)
    }

    /// Validates every input document without generating code. Returns the
    /// number of documents checked.
    pub fn check(&self) -> Result<usize, CompilerError> {
        let inputs = self.inputs()?;
        for (source, _) in &inputs {
            let document = frontend::load_document(source)?;
            validate::validate(&document)?;
        }
        Ok(inputs.len())
    }

    /// Runs validation, normalization and generation on a parsed document,
    /// applying the configured name override and symbol strictness.
    pub fn generate_document(&self, document: &Value) -> Result<GeneratedCode, CompilerError> {
        validate::validate(document)?;

        let mut model = frontend::normalize(document);
        if let Some(name) = &self.config.model_name {
            model.name = name.clone();
        }

        let code = codegen::generate(&model);
        for note in &code.warnings {
            tracing::warn!(location = %note.location, kind = ?note.kind, "{}", note.message);
        }

        if self.config.strict_symbols {
            let notes: Vec<TranslationNote> = code.unresolved().cloned().collect();
            if !notes.is_empty() {
                return Err(CompilerError::StrictSymbols { notes });
            }
        }

        Ok(code)
    }

    /// Input documents paired with their output directories. A directory
    /// input compiles each document into `out_dir/<file stem>/`.
    fn inputs(&self) -> Result<Vec<(PathBuf, PathBuf)>, CompilerError> {
        let input = &self.config.input;
        if !input.is_dir() {
            return Ok(vec![(input.clone(), self.config.out_dir.clone())]);
        }

        let documents = frontend::discover_models(input)?;
        Ok(documents
            .into_iter()
            .map(|path| {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| "model".to_string());
                let out_dir = self.config.out_dir.join(stem);
                (path, out_dir)
            })
            .collect())
    }

    /// Writes generated code to an output directory.
    fn write_output(&self, out_dir: &Path, generated: &GeneratedCode) -> Result<(), CompilerError> {
        std::fs::create_dir_all(out_dir).map_err(|e| CompilerError::io(out_dir, e.to_string()))?;

        for (filename, content) in &generated.files {
            let path = out_dir.join(filename);
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CompilerError::io(parent, e.to_string()))?;
            }
            std::fs::write(&path, content).map_err(|e| CompilerError::IoError {
                path,
                message: e.to_string(),
            })?;
        }

        tracing::debug!(out_dir = %out_dir.display(), files = generated.files.len(), "wrote generated project");
        Ok(())
    }
}
