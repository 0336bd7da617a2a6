//! C5: CodeAct claim verifier. Generates verification programs for
//! batches of claims, runs each program in a hand-written sandbox
//! interpreter against the repository, then evaluates the gathered
//! evidence into a verdict in a second batched LLM call, falling back to
//! a heuristic verdict when generation, execution, or evaluation fails
//! (§4.5).

mod codegen;
mod eval;
mod pipeline;
pub mod sandbox;
mod types;

pub use pipeline::{verify_claim, verify_claims_batched};
pub use types::{EvidenceDetail, VerificationEvidence, VerificationVerdict};
