//! Model document loading and normalization.
//!
//! A model is a single JSON document. The frontend reads it from disk,
//! finds documents below a directory, and turns a document into the
//! canonical [`Model`](crate::ir::Model).

pub mod document;
pub mod normalize;

use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::diagnostic::CompilerError;

pub use normalize::normalize;

/// File extensions recognized as model documents.
pub const MODEL_EXTENSIONS: &[&str] = &["json"];

/// Reads and parses one model document.
pub fn load_document(path: &Path) -> Result<Value, CompilerError> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| CompilerError::io(path, e.to_string()))?;
    parse_document(&source, path)
}

/// Parses document text; `path` is only used for error reporting.
pub fn parse_document(source: &str, path: &Path) -> Result<Value, CompilerError> {
    serde_json::from_str(source).map_err(|e| CompilerError::InvalidJson {
        path: path.to_path_buf(),
        message: e.to_string(),
        line: e.line(),
        column: e.column(),
    })
}

/// Every model document below `dir`, sorted by path.
pub fn discover_models(dir: &Path) -> Result<Vec<PathBuf>, CompilerError> {
    let mut found = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy();
            if MODEL_EXTENSIONS.contains(&ext_str.as_ref()) {
                found.push(path.to_path_buf());
            }
        }
    }

    if found.is_empty() {
        return Err(CompilerError::NoModels {
            dir: dir.to_path_buf(),
        });
    }

    found.sort();
    tracing::debug!(count = found.len(), dir = %dir.display(), "discovered model documents");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovers_json_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("nested/a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let found = discover_models(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("b.json"));
    }

    #[test]
    fn test_empty_directory_has_no_models() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_models(dir.path()).unwrap_err();
        assert!(matches!(err, CompilerError::NoModels { .. }));
    }

    #[test]
    fn test_reports_json_position() {
        let err = parse_document("{\n  \"model\": [,]\n}", Path::new("m.json")).unwrap_err();
        match err {
            CompilerError::InvalidJson { line, path, .. } => {
                assert_eq!(line, 2);
                assert_eq!(path, PathBuf::from("m.json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
