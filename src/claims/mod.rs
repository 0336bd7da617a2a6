//! Claim extraction (C4): chunk the model card, extract checkable claims
//! from each chunk with a bounded LLM worker pool, cache per-chunk
//! results, and dedupe across chunks.

mod chunker;
mod extractor;
mod prompts;
mod types;

pub use chunker::{chunk_text, chunk_text_with_budget};
pub use extractor::extract_claims;
pub use types::{Chunk, Claim, ClaimCategory};
