//! Structural (AST-pattern) search via an external structural-grep binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::Result;

/// A structural match reported by the structural-grep binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstMatch {
    pub file: PathBuf,
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    file: String,
    range: RawRange,
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawRange {
    start: RawPosition,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    line: usize,
}

/// Run a structural-grep pattern search over `paths` (or the whole repo if
/// empty), restricted to `language`. Any failure — missing binary, nonzero
/// exit, unparseable JSON — degrades to an empty result rather than an
/// error, matching the tolerant behavior of the original tool: a search
/// primitive failing shouldn't abort the claim being checked.
pub async fn ast_search(sg_binary: &Path, pattern: &str, language: &str, paths: &[PathBuf]) -> Result<Vec<AstMatch>> {
    let mut command = Command::new(sg_binary);
    command
        .arg("run")
        .arg("-p")
        .arg(pattern)
        .arg("-l")
        .arg(language)
        .arg("--json")
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    for path in paths {
        command.arg(path);
    }

    let output = match command.output().await {
        Ok(output) => output,
        Err(_) => return Ok(Vec::new()),
    };

    if !output.status.success() {
        return Ok(Vec::new());
    }

    let raw_matches: Vec<RawMatch> = match serde_json::from_slice(&output.stdout) {
        Ok(parsed) => parsed,
        Err(_) => return Ok(Vec::new()),
    };

    Ok(raw_matches
        .into_iter()
        .map(|m| AstMatch {
            file: PathBuf::from(m.file),
            line: m.range.start.line,
            text: m.text,
        })
        .collect())
}
