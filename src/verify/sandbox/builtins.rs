//! The standard host-function table exposed to CodeAct verification
//! programs (§4.5.2): string/list helpers plus the three bound search
//! tools `code_search`, `notebook_search`, `artifact_search`. Every search
//! tool degrades to an empty list on any failure rather than raising
//! (§4.1) — a generated program can always inspect its evidence without
//! handling an exception from the tools themselves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::search::{search_code_cells, search_outputs, text_search_blocking};

use super::interpreter::{Builtins, HostFn, Value};

fn evidence_dict(file: impl Into<String>, line: Option<usize>, cell: Option<usize>, snippet: impl Into<String>) -> Value {
    let mut map = HashMap::new();
    map.insert("file".to_string(), Value::Str(file.into()));
    map.insert(
        "line".to_string(),
        line.map(|n| Value::Number(n as f64)).unwrap_or(Value::None),
    );
    map.insert(
        "cell".to_string(),
        cell.map(|n| Value::Number(n as f64)).unwrap_or(Value::None),
    );
    map.insert("snippet".to_string(), Value::Str(snippet.into()));
    Value::Dict(map)
}

/// `code_search(query)`: grep the repository's `*.py` files for `query`,
/// returning a list of `{file, line, cell, snippet}` dicts.
fn code_search(repo_root: &Path, args: &[Value]) -> Result<Value> {
    require_arity("code_search", args, 1)?;
    let query = args[0].as_str()?;

    let matches = text_search_blocking(repo_root, query, "*.py", 1).unwrap_or_default();
    Ok(Value::List(
        matches
            .into_iter()
            .map(|m| evidence_dict(m.file.to_string_lossy(), Some(m.line), None, m.content))
            .collect(),
    ))
}

/// `notebook_search(query)`: search every `*.ipynb` under the repository's
/// code cells and cell outputs for `query`, returning a list of
/// `{file, line, cell, snippet}` dicts.
fn notebook_search(repo_root: &Path, args: &[Value]) -> Result<Value> {
    require_arity("notebook_search", args, 1)?;
    let query = args[0].as_str()?;

    let notebooks = find_notebooks(repo_root);
    let mut hits = Vec::new();
    for path in notebooks {
        for m in search_code_cells(&path, query).unwrap_or_default() {
            hits.push(evidence_dict(m.file.to_string_lossy(), None, Some(m.cell_index), m.content));
        }
        for m in search_outputs(&path, query).unwrap_or_default() {
            hits.push(evidence_dict(m.file.to_string_lossy(), None, Some(m.cell_index), m.content));
        }
    }
    Ok(Value::List(hits))
}

fn find_notebooks(repo_root: &Path) -> Vec<PathBuf> {
    let pattern = repo_root.join("**").join("*.ipynb");
    let pattern = pattern.to_string_lossy().to_string();
    match glob::glob(&pattern) {
        Ok(entries) => entries.filter_map(|e| e.ok()).collect(),
        Err(_) => Vec::new(),
    }
}

/// `artifact_search(pattern)`: glob the repository for files matching
/// `pattern` (e.g. `*.ckpt`), returning a list of `{file, line, cell,
/// snippet}` dicts, `snippet` holding the file name.
fn artifact_search(repo_root: &Path, args: &[Value]) -> Result<Value> {
    require_arity("artifact_search", args, 1)?;
    let pattern = args[0].as_str()?;

    let paths = crate::search::find_artifacts(repo_root, pattern).unwrap_or_default();
    Ok(Value::List(
        paths
            .into_iter()
            .map(|p| {
                let name = p.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
                evidence_dict(p.to_string_lossy(), None, None, name)
            })
            .collect(),
    ))
}

/// Build the standard builtins table: `contains`/`lower`/`len`/`str`/`abs`
/// plus the three bound search tools, each closing over `repo_root`.
pub fn standard_builtins(repo_root: &Path) -> Builtins {
    let mut builtins = Builtins::new();

    builtins.register(
        "contains",
        Box::new(|args: &[Value]| {
            require_arity("contains", args, 2)?;
            Ok(Value::Bool(args[0].as_str()?.contains(args[1].as_str()?)))
        }),
    );

    builtins.register(
        "lower",
        Box::new(|args: &[Value]| {
            require_arity("lower", args, 1)?;
            Ok(Value::Str(args[0].as_str()?.to_lowercase()))
        }),
    );

    builtins.register(
        "len",
        Box::new(|args: &[Value]| {
            require_arity("len", args, 1)?;
            match &args[0] {
                Value::Str(s) => Ok(Value::Number(s.chars().count() as f64)),
                Value::List(items) => Ok(Value::Number(items.len() as f64)),
                Value::Dict(map) => Ok(Value::Number(map.len() as f64)),
                other => Err(Error::sandbox(format!("len() does not support {other:?}"))),
            }
        }),
    );

    builtins.register(
        "str",
        Box::new(|args: &[Value]| {
            require_arity("str", args, 1)?;
            Ok(Value::Str(display_value(&args[0])))
        }),
    );

    builtins.register(
        "abs",
        Box::new(|args: &[Value]| {
            require_arity("abs", args, 1)?;
            Ok(Value::Number(args[0].as_number()?.abs()))
        }),
    );

    let code_search_root = repo_root.to_path_buf();
    builtins.register(
        "code_search",
        Box::new(move |args: &[Value]| code_search(&code_search_root, args)) as HostFn,
    );

    let notebook_search_root = repo_root.to_path_buf();
    builtins.register(
        "notebook_search",
        Box::new(move |args: &[Value]| notebook_search(&notebook_search_root, args)) as HostFn,
    );

    let artifact_search_root = repo_root.to_path_buf();
    builtins.register(
        "artifact_search",
        Box::new(move |args: &[Value]| artifact_search(&artifact_search_root, args)) as HostFn,
    );

    builtins
}

fn require_arity(name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::sandbox(format!(
            "{name}() expects {expected} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::None => "None".to_string(),
        Value::List(items) => {
            format!("[{}]", items.iter().map(display_value).collect::<Vec<_>>().join(", "))
        }
        Value::Dict(map) => format!("{{{} entries}}", map.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::sandbox::interpreter::run;
    use crate::verify::sandbox::lexer::lex;
    use crate::verify::sandbox::parser::parse;

    #[test]
    fn code_search_finds_matches_in_a_real_repo() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("train.py"), "accuracy = 0.95\n").unwrap();

        let builtins = standard_builtins(dir.path());
        let tokens = lex("hits = code_search(\"0.95\")\nfound = len(hits) > 0\n").unwrap();
        let program = parse(&tokens).unwrap();
        let env = run(&program, &builtins).unwrap();

        assert_eq!(env.get("found"), Some(&Value::Bool(true)));
    }

    #[test]
    fn code_search_on_no_matches_degrades_to_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("train.py"), "loss = 0.1\n").unwrap();

        let builtins = standard_builtins(dir.path());
        let tokens = lex("hits = code_search(\"nonexistent_token\")\ncount = len(hits)\n").unwrap();
        let program = parse(&tokens).unwrap();
        let env = run(&program, &builtins).unwrap();

        assert_eq!(env.get("count"), Some(&Value::Number(0.0)));
    }

    #[test]
    fn artifact_search_finds_files_by_glob() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("checkpoints")).unwrap();
        std::fs::write(dir.path().join("checkpoints/model.ckpt"), b"").unwrap();

        let builtins = standard_builtins(dir.path());
        let tokens = lex("hits = artifact_search(\"*.ckpt\")\ncount = len(hits)\n").unwrap();
        let program = parse(&tokens).unwrap();
        let env = run(&program, &builtins).unwrap();

        assert_eq!(env.get("count"), Some(&Value::Number(1.0)));
    }
}
