//! Prompting the evaluation LLM to turn gathered evidence into a verdict
//! (phase 3 of the 3-phase CodeAct pipeline, §4.5.1/§4.5.5). This is the
//! pass that actually judges a claim: phase 1 only generates code, phase 2
//! only executes it, and it's this call that reads `(claim, evidence,
//! program)` and decides `verified`/`confidence`/`reasoning`/
//! `discrepancies`.

use uuid::Uuid;

use super::types::VerificationEvidence;

/// One claim's evaluation input: the claim text, the evidence its
/// generated program gathered, and a preview of that program (truncated,
/// since the evaluator needs only enough of it to judge how the evidence
/// was gathered, not to re-derive it).
pub struct EvalItem<'a> {
    pub claim_id: Uuid,
    pub claim_text: &'a str,
    pub evidence: &'a VerificationEvidence,
    pub program: &'a str,
}

const PROGRAM_PREVIEW_CHARS: usize = 400;

fn program_preview(program: &str) -> String {
    if program.len() <= PROGRAM_PREVIEW_CHARS {
        program.to_string()
    } else {
        format!("{}...", &program[..PROGRAM_PREVIEW_CHARS])
    }
}

/// System prompt for a batch of `batch_size` evaluation items: the model
/// must return a JSON array of exactly `batch_size` verdict objects, one
/// per item, in the same order.
pub fn batch_eval_system_prompt(batch_size: usize) -> String {
    format!(
        "You are the evaluation stage of a model-card verification \
         pipeline. For each claim you are given the claim text, the \
         evidence a verification program gathered from the repository, \
         and a preview of that program. Decide whether the evidence \
         actually supports the claim.\n\n\
         Respond with only a JSON object of the form \
         {{\"verdicts\": [{{\"verified\": bool, \"confidence\": number \
         between 0 and 1, \"reasoning\": string, \"discrepancies\": \
         [string, ...]}}, ...]}} containing exactly {batch_size} verdict \
         objects, one per claim, in the order the claims were given. \
         `discrepancies` lists specific mismatches between the claim and \
         the evidence (e.g. a different reported metric value); use an \
         empty list when there are none. No prose, no markdown fences \
         around the JSON."
    )
}

/// User prompt listing each batch item's claim, evidence, and program
/// preview.
pub fn batch_eval_user_prompt(items: &[EvalItem<'_>]) -> String {
    let listed = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "{}. Claim: {}\n   Evidence found: {}\n   Evidence count: {}\n   \
                 Evidence summary: {}\n   Program preview: {}",
                i + 1,
                item.claim_text,
                item.evidence.found,
                item.evidence.evidence_count,
                item.evidence.summary,
                program_preview(item.program),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("Evaluate each claim below, in order:\n\n{listed}\n\nReturn the JSON object described in the system prompt.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_evidence() -> VerificationEvidence {
        VerificationEvidence::new(true, Vec::new(), "matched reported accuracy")
    }

    #[test]
    fn system_prompt_lists_batch_size_and_verdict_shape() {
        let prompt = batch_eval_system_prompt(5);
        assert!(prompt.contains("exactly 5 verdict"));
        assert!(prompt.contains("discrepancies"));
    }

    #[test]
    fn user_prompt_lists_claim_and_evidence_summary() {
        let evidence = sample_evidence();
        let items = vec![EvalItem {
            claim_id: Uuid::nil(),
            claim_text: "Achieves 95% accuracy",
            evidence: &evidence,
            program: "result = {}\n",
        }];
        let prompt = batch_eval_user_prompt(&items);
        assert!(prompt.contains("Achieves 95% accuracy"));
        assert!(prompt.contains("matched reported accuracy"));
    }

    #[test]
    fn long_programs_are_truncated_in_the_preview() {
        let long_program = "x = 1\n".repeat(200);
        assert!(program_preview(&long_program).len() < long_program.len());
    }
}
