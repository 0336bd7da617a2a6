//! Prompting the LLM to generate one verification program per claim in a
//! batch (phase 1 of the 3-phase CodeAct pipeline, §4.5.1/§4.5.2).

use uuid::Uuid;

/// The three tool instances every generated program may call (§4.5.2).
/// Each returns a list of `{file, line, cell, snippet}` dicts — `line`/
/// `cell` are `None` when not applicable to that tool.
pub const BOUND_TOOLS: &[(&str, &str)] = &[
    (
        "code_search(query)",
        "grep the repository's Python source for `query`",
    ),
    (
        "notebook_search(query)",
        "search notebook code cells and their outputs for `query`",
    ),
    (
        "artifact_search(pattern)",
        "glob the repository for files matching `pattern` (e.g. checkpoints, configs)",
    ),
];

/// System prompt for a batch of `batch_size` claims: the model must
/// return a JSON array of exactly `batch_size` program strings, one per
/// claim, in the same order.
pub fn batch_codegen_system_prompt(batch_size: usize) -> String {
    let tools = BOUND_TOOLS
        .iter()
        .map(|(sig, desc)| format!("- `{sig}`: {desc}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You write short verification programs in a restricted, \
         Python-like language with no imports and no access to the \
         filesystem or network except through these three bound tools:\n\
         {tools}\n\n\
         A program may call a tool more than once and may chain multiple \
         tool calls to cross-check a claim. Each program must assign a \
         single local `result`, a dict with exactly these keys: \
         `found` (boolean), `evidence_count` (integer), `evidence_details` \
         (a list of the dicts returned by the tools you called, the ones \
         that actually support the claim), and `summary` (a short string). \
         `evidence_count` must equal the length of `evidence_details`.\n\n\
         Respond with only a JSON object of the form \
         {{\"programs\": [\"<program 1>\", \"<program 2>\", ...]}} \
         containing exactly {batch_size} program strings, one per claim, \
         in the order the claims were given. No prose, no markdown fences \
         around the JSON."
    )
}

/// User prompt listing the batch's claims by index, each paired with the
/// claim text the generated program must check.
pub fn batch_codegen_user_prompt(claims: &[(Uuid, String)]) -> String {
    let listed = claims
        .iter()
        .enumerate()
        .map(|(i, (_, text))| format!("{}. {text}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Write one verification program per claim below, in order:\n\n{listed}\n\n\
         Return the JSON object described in the system prompt."
    )
}

/// A minimal program used when codegen fails to produce a usable program
/// for a claim (batch short, parse failure, etc.) — it always runs and
/// always reports no evidence, padding the batch out to the right length
/// rather than leaving a claim's verification undone (§7).
pub fn fallback_program() -> String {
    "result = {\"found\": False, \"evidence_count\": 0, \"evidence_details\": [], \"summary\": \"codegen unavailable for this claim\"}\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_lists_bound_tools_and_batch_size() {
        let prompt = batch_codegen_system_prompt(10);
        assert!(prompt.contains("code_search"));
        assert!(prompt.contains("notebook_search"));
        assert!(prompt.contains("artifact_search"));
        assert!(prompt.contains("exactly 10 program strings"));
    }

    #[test]
    fn user_prompt_lists_claims_in_order() {
        let claims = vec![
            (Uuid::nil(), "Achieves 95% accuracy".to_string()),
            (Uuid::nil(), "Uses a transformer encoder".to_string()),
        ];
        let prompt = batch_codegen_user_prompt(&claims);
        assert!(prompt.contains("1. Achieves 95% accuracy"));
        assert!(prompt.contains("2. Uses a transformer encoder"));
    }

    #[test]
    fn fallback_program_sets_a_well_formed_result() {
        let program = fallback_program();
        assert!(program.contains("result ="));
        assert!(program.contains("\"found\": False"));
    }
}
