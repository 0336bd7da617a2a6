//! Compound search operations built on the text/AST/notebook primitives.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::text::{text_search, TextMatch};

/// Find a function's definition and call sites.
pub async fn function_search(repo: &Path, name: &str, include_glob: &str) -> Result<Vec<TextMatch>> {
    let mut matches = text_search(repo, &format!("def {name}"), include_glob, 2).await?;
    matches.extend(text_search(repo, &format!("{name}("), include_glob, 2).await?);
    dedup_matches(matches)
}

/// Find import statements referencing `module`, trying a few common import
/// phrasings.
pub async fn import_search(repo: &Path, module: &str, include_glob: &str) -> Result<Vec<TextMatch>> {
    let queries = [
        format!("import {module}"),
        format!("from {module} import"),
        format!("from {module}.") ,
    ];

    let mut matches = Vec::new();
    for query in queries {
        matches.extend(text_search(repo, &query, include_glob, 1).await?);
    }
    dedup_matches(matches)
}

fn dedup_matches(matches: Vec<TextMatch>) -> Result<Vec<TextMatch>> {
    let mut seen = std::collections::HashSet::new();
    let mut deduped = Vec::new();
    for m in matches {
        let key = (m.file.clone(), m.line);
        if seen.insert(key) {
            deduped.push(m);
        }
    }
    Ok(deduped)
}

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "of", "to", "in", "on", "for", "and", "or", "is", "are", "with", "by",
    "this", "that", "it", "as", "at", "be", "was", "were", "has", "have", "had",
];

fn keywords(text: &str) -> Vec<String> {
    let word_re = Regex::new(r"[A-Za-z_][A-Za-z0-9_]{2,}").unwrap();
    word_re
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Rank matches across keywords extracted from `query` by how many
/// distinct keywords hit the same (file, line), descending, returning the
/// top `top_k`.
pub async fn semantic_search(repo: &Path, query: &str, include_glob: &str, top_k: usize) -> Result<Vec<TextMatch>> {
    let keywords = keywords(query);
    if keywords.is_empty() {
        return Ok(Vec::new());
    }

    let mut scores: HashMap<(PathBuf, usize), (TextMatch, usize)> = HashMap::new();
    for keyword in &keywords {
        for m in text_search(repo, keyword, include_glob, 1).await? {
            let key = (m.file.clone(), m.line);
            scores
                .entry(key)
                .and_modify(|(_, count)| *count += 1)
                .or_insert((m, 1));
        }
    }

    let mut ranked: Vec<(TextMatch, usize)> = scores.into_values().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(ranked.into_iter().take(top_k).map(|(m, _)| m).collect())
}

/// Find files matching a glob pattern rooted at `repo` (e.g. artifact
/// files such as checkpoints, configs, or datasets named in a claim).
pub fn find_artifacts(repo: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = repo.join("**").join(pattern);
    let full_pattern = full_pattern.to_string_lossy().to_string();

    let entries = glob::glob(&full_pattern)
        .map_err(|e| crate::error::Error::config(format!("invalid artifact glob pattern: {e}")))?;

    Ok(entries.filter_map(|entry| entry.ok()).collect())
}

/// Whether an artifact (file name or path fragment) is referenced anywhere
/// in source (`*.py`) or notebooks (`*.ipynb`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactUsage {
    pub artifact: String,
    pub referenced: bool,
    pub matches: Vec<TextMatch>,
}

pub async fn check_artifact_usage(repo: &Path, artifact_name: &str) -> Result<ArtifactUsage> {
    let mut matches = text_search(repo, artifact_name, "*.py", 1).await?;
    matches.extend(text_search(repo, artifact_name, "*.ipynb", 1).await?);
    let matches = dedup_matches(matches)?;

    Ok(ArtifactUsage {
        artifact: artifact_name.to_string(),
        referenced: !matches.is_empty(),
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_extraction_drops_stopwords_and_short_tokens() {
        let words = keywords("The model achieves an accuracy of 95% on the test set");
        assert!(words.contains(&"model".to_string()));
        assert!(words.contains(&"achieves".to_string()));
        assert!(words.contains(&"accuracy".to_string()));
        assert!(!words.contains(&"the".to_string()));
        assert!(!words.contains(&"of".to_string()));
        assert!(!words.contains(&"on".to_string()));
    }

    #[test]
    fn find_artifacts_matches_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("checkpoints")).unwrap();
        std::fs::write(dir.path().join("checkpoints/model.ckpt"), b"").unwrap();

        let found = find_artifacts(dir.path(), "*.ckpt").unwrap();
        assert_eq!(found.len(), 1);
    }
}
