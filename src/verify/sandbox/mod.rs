//! Hand-written restricted-language interpreter used to evaluate
//! CodeAct-generated verification programs (§4.5.3): lexer → parser → AST
//! → tree-walking evaluator. There is no embedded scripting engine and no
//! access to the host process beyond the three bound search tools
//! (§4.5.2) — a generated program can only call the functions explicitly
//! registered in [`standard_builtins`].

mod ast;
mod builtins;
mod interpreter;
mod lexer;
mod parser;

pub use builtins::standard_builtins;
pub use interpreter::{run_with_env, Builtins, HostFn, Value};

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// Parse and run `source` with the standard builtins bound against
/// `repo_root` — `code_search`/`notebook_search`/`artifact_search` read
/// the repository live as the program calls them, rather than from
/// pre-fetched evidence — returning the final variable namespace.
pub fn evaluate(source: &str, repo_root: &Path) -> Result<HashMap<String, Value>> {
    let tokens = lexer::lex(source)?;
    let program = parser::parse(&tokens)?;
    let builtins = standard_builtins(repo_root);
    interpreter::run_with_env(&program, HashMap::new(), &builtins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("eval.py"), "test_accuracy = 0.953\n").unwrap();

        let source = "hits = code_search(\"0.953\")\nif len(hits) > 0:\n    found = True\n    confidence = 0.9\nelse:\n    found = False\n    confidence = 0.1\nreasoning = \"matched reported accuracy\"\n";
        let env = evaluate(source, dir.path()).unwrap();

        assert_eq!(env.get("found"), Some(&Value::Bool(true)));
        assert_eq!(env.get("confidence"), Some(&Value::Number(0.9)));
    }

    #[test]
    fn evaluate_surfaces_sandbox_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = evaluate("found = undefined_var\n", dir.path());
        assert!(result.is_err());
    }
}
