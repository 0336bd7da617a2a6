//! End-to-end tests for the CodeAct sandbox interpreter: lex → parse →
//! evaluate against a real repository checkout via the bound search
//! tools, exercising behavior that spans the lexer/parser/evaluator/
//! builtins modules rather than any one of them in isolation.

use cardcheck_core::verify::sandbox::{evaluate, Value};

fn repo_with_file(name: &str, content: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(name), content).unwrap();
    dir
}

#[test]
fn verifies_a_claim_against_matching_evidence() {
    let repo = repo_with_file("eval.py", "reported test accuracy: 0.953\n");

    let program = r#"
hits = code_search("0.953")
if len(hits) > 0:
    found = True
    confidence = 0.9
else:
    found = False
    confidence = 0.1
reasoning = "checked repo for reported accuracy"
"#;

    let env = evaluate(program, repo.path()).unwrap();
    assert_eq!(env.get("found"), Some(&Value::Bool(true)));
    assert_eq!(env.get("confidence"), Some(&Value::Number(0.9)));
}

#[test]
fn refutes_a_claim_against_contradicting_evidence() {
    let repo = repo_with_file("eval.py", "reported test accuracy: 0.62\n");

    let program = r#"
hits = code_search("0.953")
if len(hits) > 0:
    found = True
    confidence = 0.9
else:
    found = False
    confidence = 0.1
reasoning = "no match in repo"
"#;

    let env = evaluate(program, repo.path()).unwrap();
    assert_eq!(env.get("found"), Some(&Value::Bool(false)));
}

#[test]
fn iterates_over_tool_results_and_indexes_dicts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("train.py"), "def step():\n    pass\n").unwrap();
    std::fs::write(dir.path().join("eval.py"), "def step():\n    pass\n").unwrap();

    let program = r#"
hits = code_search("step")
count = 0
for m in hits:
    count = count + 1
first_file = hits[0]["file"]
"#;

    let env = evaluate(program, dir.path()).unwrap();
    assert_eq!(env.get("count"), Some(&Value::Number(2.0)));
    assert!(matches!(env.get("first_file"), Some(Value::Str(_))));
}

#[test]
fn calling_an_unregistered_function_is_a_sandbox_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = evaluate("found = os_system(\"rm -rf /\")\n", dir.path());
    assert!(result.is_err());
}

#[test]
fn division_by_zero_is_a_sandbox_error_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let result = evaluate("x = 1 / 0\n", dir.path());
    assert!(result.is_err());
}

#[test]
fn a_runaway_loop_trips_the_step_budget_instead_of_hanging() {
    let dir = tempfile::tempdir().unwrap();
    let items: Vec<String> = (0..500).map(|i| i.to_string()).collect();
    let literal = format!("[{}]", items.join(", "));
    let program = format!(
        "outer = {literal}\ninner = {literal}\ncount = 0\nfor x in outer:\n    for y in inner:\n        count = count + 1\n"
    );
    let result = evaluate(&program, dir.path());
    assert!(result.is_err(), "expected the step budget to trip before the loop completes");
}

#[test]
fn string_helpers_compose_across_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let program = "label = \"Leakage-Free Split\"\nnormalized = lower(label)\nflag = contains(normalized, \"leakage-free\")\n";
    let env = evaluate(program, dir.path()).unwrap();
    assert_eq!(env.get("flag"), Some(&Value::Bool(true)));
}

#[test]
fn notebook_search_and_artifact_search_are_reachable_from_generated_programs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("report.ipynb"),
        r#"{"cells":[{"cell_type":"code","source":["acc = 0.953"],"outputs":[{"output_type":"stream","text":["Test accuracy: 0.953\n"]}]}]}"#,
    )
    .unwrap();
    std::fs::create_dir_all(dir.path().join("checkpoints")).unwrap();
    std::fs::write(dir.path().join("checkpoints/final.ckpt"), b"").unwrap();

    let program = r#"
nb_hits = notebook_search("0.953")
artifact_hits = artifact_search("*.ckpt")
found = len(nb_hits) > 0 and len(artifact_hits) > 0
"#;

    let env = evaluate(program, dir.path()).unwrap();
    assert_eq!(env.get("found"), Some(&Value::Bool(true)));
}
