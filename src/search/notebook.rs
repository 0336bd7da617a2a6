//! Jupyter notebook (`.ipynb`) search: code cells and their outputs.
//!
//! Notebooks are traversed as plain JSON rather than a typed notebook
//! schema, since malformed or version-skewed notebooks are common in the
//! wild; a single cell with an unexpected shape is skipped rather than
//! failing the whole notebook.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookMatch {
    pub file: PathBuf,
    pub cell_index: usize,
    pub content: String,
}

fn cell_source(cell: &Value) -> Option<String> {
    match cell.get("source")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => Some(
            parts
                .iter()
                .filter_map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(""),
        ),
        _ => None,
    }
}

fn output_text(output: &Value) -> Option<String> {
    let output_type = output.get("output_type")?.as_str()?;
    match output_type {
        "stream" => cell_source_like(output.get("text")?),
        "execute_result" | "display_data" => {
            let data = output.get("data")?;
            data.get("text/plain").and_then(cell_source_like)
        }
        _ => None,
    }
}

fn cell_source_like(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => Some(
            parts
                .iter()
                .filter_map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(""),
        ),
        _ => None,
    }
}

fn load_notebook(path: &Path) -> Option<Value> {
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

/// Search code cells for `query` (case-insensitive substring match).
pub fn search_code_cells(path: &Path, query: &str) -> Result<Vec<NotebookMatch>> {
    let notebook = match load_notebook(path) {
        Some(nb) => nb,
        None => return Ok(Vec::new()),
    };
    let cells = match notebook.get("cells").and_then(|c| c.as_array()) {
        Some(cells) => cells,
        None => return Ok(Vec::new()),
    };

    let query_lower = query.to_lowercase();
    let mut matches = Vec::new();

    for (index, cell) in cells.iter().enumerate() {
        if cell.get("cell_type").and_then(|t| t.as_str()) != Some("code") {
            continue;
        }
        let Some(source) = cell_source(cell) else {
            continue;
        };
        if source.to_lowercase().contains(&query_lower) {
            matches.push(NotebookMatch {
                file: path.to_path_buf(),
                cell_index: index,
                content: source,
            });
        }
    }

    Ok(matches)
}

/// Search cell outputs (stream, execute_result, display_data) for `query`.
pub fn search_outputs(path: &Path, query: &str) -> Result<Vec<NotebookMatch>> {
    let notebook = match load_notebook(path) {
        Some(nb) => nb,
        None => return Ok(Vec::new()),
    };
    let cells = match notebook.get("cells").and_then(|c| c.as_array()) {
        Some(cells) => cells,
        None => return Ok(Vec::new()),
    };

    let query_lower = query.to_lowercase();
    let mut matches = Vec::new();

    for (index, cell) in cells.iter().enumerate() {
        let Some(outputs) = cell.get("outputs").and_then(|o| o.as_array()) else {
            continue;
        };
        for output in outputs {
            let Some(text) = output_text(output) else {
                continue;
            };
            if text.to_lowercase().contains(&query_lower) {
                matches.push(NotebookMatch {
                    file: path.to_path_buf(),
                    cell_index: index,
                    content: text,
                });
            }
        }
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_notebook(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("test.ipynb");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn finds_query_in_code_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_notebook(
            dir.path(),
            r#"{"cells":[{"cell_type":"code","source":["accuracy = 0.95\n","print(accuracy)"]}]}"#,
        );
        let matches = search_code_cells(&path, "accuracy").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].cell_index, 0);
    }

    #[test]
    fn finds_query_in_stream_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_notebook(
            dir.path(),
            r#"{"cells":[{"cell_type":"code","source":[],"outputs":[{"output_type":"stream","text":["Test accuracy: 0.953\n"]}]}]}"#,
        );
        let matches = search_outputs(&path, "0.953").unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn malformed_notebook_yields_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_notebook(dir.path(), "not valid json{{{");
        assert!(search_code_cells(&path, "x").unwrap().is_empty());
        assert!(search_outputs(&path, "x").unwrap().is_empty());
    }

    #[test]
    fn markdown_cells_are_skipped_in_code_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_notebook(
            dir.path(),
            r#"{"cells":[{"cell_type":"markdown","source":["accuracy 0.95"]}]}"#,
        );
        assert!(search_code_cells(&path, "accuracy").unwrap().is_empty());
    }
}
