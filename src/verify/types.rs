//! Verification result types (C5, §3).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One piece of evidence a generated program found and recorded into
/// `result.evidence_details` (§3): a file/line hit from `code_search`, a
/// cell from `notebook_search`, or an artifact path from `artifact_search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceDetail {
    pub file: String,
    /// Source line number, when the hit came from `code_search`.
    pub line: Option<usize>,
    /// Notebook cell index, when the hit came from `notebook_search`.
    pub cell: Option<usize>,
    pub snippet: String,
}

/// The evidence a verification program gathered and reported back (§3).
/// `evidence_count` is derived from `evidence_details.len()` at
/// construction so the two can never drift apart (§8 invariant).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationEvidence {
    pub found: bool,
    pub evidence_count: usize,
    pub evidence_details: Vec<EvidenceDetail>,
    pub summary: String,
}

impl VerificationEvidence {
    pub fn new(found: bool, evidence_details: Vec<EvidenceDetail>, summary: impl Into<String>) -> Self {
        Self {
            found,
            evidence_count: evidence_details.len(),
            evidence_details,
            summary: summary.into(),
        }
    }

    pub fn empty(summary: impl Into<String>) -> Self {
        Self::new(false, Vec::new(), summary)
    }
}

/// Outcome of verifying one claim against the repository (§3, §4.5.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub claim_id: Uuid,
    /// Whether the evaluation LLM pass judged the claim supported by the
    /// gathered evidence.
    pub verified: bool,
    /// Confidence in `verified`, in `[0, 1]`.
    pub confidence: f64,
    pub reasoning: String,
    /// Discrepancies the evaluator called out between the claim and the
    /// evidence (empty when none were found).
    pub discrepancies: Vec<String>,
    /// The generated verification program's source, kept for auditability
    /// (§3: "re-executing `program` against the same repo reproduces
    /// `evidence`").
    pub program: String,
    /// The evidence the generated program gathered before the evaluator
    /// judged it.
    pub evidence: VerificationEvidence,
    /// Whether this verdict came from successful codegen+execution+
    /// evaluation, or a heuristic fallback (§4.5.5).
    pub used_fallback: bool,
}

impl VerificationVerdict {
    /// The §4.5.5 heuristic fallback verdict, used when codegen or the
    /// evaluation pass can't produce a usable result: `verified` mirrors
    /// `evidence.found`, confidence is fixed at 0.5/0.1.
    pub fn fallback(evidence: VerificationEvidence, program: impl Into<String>) -> Self {
        let found = evidence.found;
        Self {
            claim_id: Uuid::nil(),
            verified: found,
            confidence: if found { 0.5 } else { 0.1 },
            reasoning: format!(
                "Basic evaluation: evidence {}",
                if found { "found" } else { "not found" }
            ),
            discrepancies: Vec::new(),
            program: program.into(),
            evidence,
            used_fallback: true,
        }
    }

    pub fn with_claim(mut self, claim_id: Uuid) -> Self {
        self.claim_id = claim_id;
        self
    }
}
