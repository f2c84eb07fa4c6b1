//! Loading JSON knowledge files into plain-text documents.

use crate::error::{IngestError, IngestResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A text document and the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub text: String,
    /// File name (without directories) of the source.
    pub source: String,
}

/// List the `*.json` files directly inside `dir`, sorted by file name.
pub fn list_json_sources(dir: &Path) -> IngestResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound(dir.to_path_buf()));
    }

    let files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("json"))
                .unwrap_or(false)
        })
        .collect();

    debug!("Found {} JSON sources in {:?}", files.len(), dir);
    Ok(files)
}

/// Turn JSON files into documents.
///
/// An object file yields one document per top-level key. An array file yields
/// one document per element. Files that cannot be read or parsed are skipped.
pub fn load_json_documents<P: AsRef<Path>>(paths: &[P]) -> Vec<SourceDocument> {
    let mut docs = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let data = match read_json(path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                continue;
            }
        };

        let before = docs.len();
        match data {
            Value::Object(map) => {
                for (key, value) in map {
                    let text = match value {
                        Value::Object(inner) => {
                            let parts: Vec<String> = inner
                                .iter()
                                .map(|(k, v)| format!("{}: {}", k, render_value(v)))
                                .collect();
                            format!("{} – {}", key, parts.join("; "))
                        }
                        other => format!("{}: {}", key, render_value(&other)),
                    };
                    docs.push(SourceDocument {
                        text,
                        source: source.clone(),
                    });
                }
            }
            Value::Array(items) => {
                for item in items {
                    let text = match &item {
                        Value::Object(obj) => obj
                            .iter()
                            .map(|(k, v)| format!("{}: {}", k, render_value(v)))
                            .collect::<Vec<_>>()
                            .join("\n"),
                        other => render_value(other),
                    };
                    docs.push(SourceDocument {
                        text,
                        source: source.clone(),
                    });
                }
            }
            other => {
                warn!("Skipping {:?}: top-level value is {}", path, kind(&other));
            }
        }

        debug!("Loaded {} documents from {}", docs.len() - before, source);
    }

    docs
}

fn read_json(path: &Path) -> IngestResult<Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Strings render bare, everything else as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
