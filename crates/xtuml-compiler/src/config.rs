//! Compiler configuration.

use std::path::PathBuf;

/// Configuration for the xtUML compiler.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Model document, or a directory searched for `*.json` documents.
    pub input: PathBuf,

    /// Directory to write the generated Python project.
    pub out_dir: PathBuf,

    /// Overrides the model name declared by the document.
    pub model_name: Option<String>,

    /// Fail when action code references symbols that only resolve at run time.
    pub strict_symbols: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("model.json"),
            out_dir: PathBuf::from("generated"),
            model_name: None,
            strict_symbols: false,
        }
    }
}
