//! Repository search toolbox (C1): text, structural, and notebook search
//! primitives, plus compound operations built on top of them.
//!
//! Every primitive shells out to an external tool (`grep`, a structural
//! grep binary) or walks files directly, rather than re-implementing a
//! parser or indexer — the pipeline is a thin, auditable wrapper over
//! tools a reviewer can run by hand.

mod ast;
mod compound;
mod notebook;
mod text;

pub use ast::{ast_search, AstMatch};
pub use compound::{
    check_artifact_usage, find_artifacts, function_search, import_search, semantic_search,
    ArtifactUsage,
};
pub use notebook::{search_code_cells, search_outputs, NotebookMatch};
pub use text::{text_search, text_search_blocking, TextMatch};

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A single line match with surrounding context, common to the text and
/// notebook search primitives.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Match {
    pub file: PathBuf,
    pub line: usize,
    pub content: String,
    pub context: Vec<String>,
}

impl From<TextMatch> for Match {
    fn from(m: TextMatch) -> Self {
        Match {
            file: m.file,
            line: m.line,
            content: m.content,
            context: m.context,
        }
    }
}

/// Resolve the structural-grep binary, preferring an explicit
/// `RuntimeConfig::sg_binary_path` override and falling back to `which`.
pub fn resolve_sg_binary(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }
    which::which("sg")
        .or_else(|_| which::which("ast-grep"))
        .map_err(|_| Error::config("structural-grep binary not found on PATH; set sg_binary_path"))
}
