//! Plain-text search over a repository via `grep`.

use std::path::PathBuf;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{Error, Result};

/// Synchronous sibling of [`text_search`], for callers that can't await —
/// the sandbox's `code_search` host function (§4.5.2), which runs inside a
/// synchronous tree-walking evaluator.
pub fn text_search_blocking(
    repo: &std::path::Path,
    query: &str,
    include_glob: &str,
    context: usize,
) -> Result<Vec<TextMatch>> {
    let output = std::process::Command::new("grep")
        .arg("-r")
        .arg("-n")
        .arg("-i")
        .arg("-C")
        .arg(context.to_string())
        .arg("--include")
        .arg(include_glob)
        .arg(query)
        .arg(repo)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| Error::subprocess_comm(format!("failed to spawn grep: {e}")))?;

    if !output.status.success() && output.stdout.is_empty() {
        return Ok(Vec::new());
    }

    Ok(parse_grep_output(&String::from_utf8_lossy(&output.stdout)))
}

/// A text search hit: the matching line plus its surrounding context
/// lines, in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMatch {
    pub file: PathBuf,
    pub line: usize,
    pub content: String,
    pub context: Vec<String>,
}

/// Search `repo` for `query`, restricted to files matching `include_glob`
/// (e.g. `*.py`), with `context` lines of surrounding output on each side.
///
/// Shells out to `grep -r -n -i -C <context> --include <glob> <query> <repo>`
/// and parses the `file:line:content` / `file-line-content` output grep
/// produces in context mode. A nonzero grep exit with no output (no
/// matches) is treated as an empty result, not an error.
pub async fn text_search(
    repo: &std::path::Path,
    query: &str,
    include_glob: &str,
    context: usize,
) -> Result<Vec<TextMatch>> {
    let output = Command::new("grep")
        .arg("-r")
        .arg("-n")
        .arg("-i")
        .arg("-C")
        .arg(context.to_string())
        .arg("--include")
        .arg(include_glob)
        .arg(query)
        .arg(repo)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|e| Error::subprocess_comm(format!("failed to spawn grep: {e}")))?;

    // grep exits 1 when there are no matches; that's not a failure here.
    if !output.status.success() && output.stdout.is_empty() {
        return Ok(Vec::new());
    }

    Ok(parse_grep_output(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_grep_output(raw: &str) -> Vec<TextMatch> {
    let mut matches = Vec::new();
    let mut pending_context: Vec<String> = Vec::new();

    for line in raw.lines() {
        if line == "--" {
            pending_context.clear();
            continue;
        }

        // Matching lines use ':' as the field separator; context lines use '-'.
        if let Some((file, rest)) = split_on_first(line, ':') {
            if let Some((line_no, content)) = split_on_first(rest, ':') {
                if let Ok(line_no) = line_no.parse::<usize>() {
                    matches.push(TextMatch {
                        file: PathBuf::from(file),
                        line: line_no,
                        content: content.to_string(),
                        context: pending_context.clone(),
                    });
                    pending_context.clear();
                    continue;
                }
            }
        }

        if let Some((_, rest)) = split_on_first(line, '-') {
            if let Some((_, content)) = split_on_first(rest, '-') {
                pending_context.push(content.to_string());
                continue;
            }
        }

        pending_context.push(line.to_string());
    }

    matches
}

fn split_on_first(s: &str, sep: char) -> Option<(&str, &str)> {
    s.find(sep).map(|idx| (&s[..idx], &s[idx + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grep_context_output() {
        let raw = "src/model.py-10-def train():\nsrc/model.py:11:    accuracy = 0.95\nsrc/model.py-12-    return accuracy\n--\n";
        let matches = parse_grep_output(raw);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, 11);
        assert_eq!(matches[0].content, "    accuracy = 0.95");
        assert_eq!(matches[0].context, vec!["def train():".to_string()]);
    }

    #[test]
    fn handles_multiple_matches_separated_by_dashes() {
        let raw = "a.py:1:first\n--\na.py:5:second\n";
        let matches = parse_grep_output(raw);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].content, "first");
        assert_eq!(matches[1].content, "second");
    }

    #[test]
    fn empty_output_yields_no_matches() {
        assert!(parse_grep_output("").is_empty());
    }

    #[test]
    fn blocking_search_finds_matches_in_a_real_repo() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("train.py"), "accuracy = 0.953\n").unwrap();

        let matches = text_search_blocking(dir.path(), "0.953", "*.py", 1).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].content, "accuracy = 0.953");
    }

    #[test]
    fn blocking_search_on_no_matches_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("train.py"), "accuracy = 0.5\n").unwrap();

        let matches = text_search_blocking(dir.path(), "nonexistent_token", "*.py", 1).unwrap();
        assert!(matches.is_empty());
    }
}
