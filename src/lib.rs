//! # cardcheck-core
//!
//! A CodeAct verification pipeline for auditing ML model card claims
//! against the source repository they describe.
//!
//! ## Core components
//!
//! - **search**: repository search toolbox (text, structural, notebook).
//! - **cache**: content-addressed filesystem cache for extracted claims.
//! - **llm**: provider-agnostic LLM gateway (Anthropic, OpenAI, OpenAI-compatible
//!   aggregators) with JSON-mode-with-fallback structured output and batched
//!   execution.
//! - **claims**: model-card chunking and bounded-worker claim extraction.
//! - **verify**: CodeAct claim verification via a hand-written sandbox
//!   interpreter, with a heuristic fallback.
//! - **risk**: weighted consistency scoring, risk banding, and report assembly.
//! - **orchestrator**: the top-level `verify` entry point tying the above
//!   together, with a sanitized progress-event stream (`progress`).
//! - **config**: the `RuntimeConfig` record every component reads from.
//! - **error**: the crate-wide error taxonomy, including the LLM gateway's
//!   classified error variants.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cardcheck_core::{AnthropicClient, ClientConfig, ChatMessage, CompletionRequest, LLMClient};
//!
//! let client = AnthropicClient::new(ClientConfig::new("your-api-key"));
//! let request = CompletionRequest::new().with_message(ChatMessage::user("Hello"));
//! let response = client.complete(request).await?;
//! ```

pub mod cache;
pub mod claims;
pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod progress;
pub mod risk;
pub mod search;
pub mod verify;

pub use cache::{CacheEntryMeta, CacheStats, ClaimCache};
pub use claims::{chunk_text, extract_claims, Chunk, Claim, ClaimCategory};
pub use config::RuntimeConfig;
pub use error::{Error, GatewayError, Result};
pub use search::{
    ast_search, check_artifact_usage, find_artifacts, function_search, import_search,
    resolve_sg_binary, semantic_search, search_code_cells, search_outputs, text_search_blocking,
    AstMatch, ArtifactUsage, Match, NotebookMatch, TextMatch,
};
pub use llm::{
    AnthropicClient, BatchConfig, BatchExecutor, BatchQueryResult, BatchedLLMQuery,
    BatchedQueryResults, ChatMessage, ChatRole, ClientConfig, CompletionRequest,
    CompletionResponse, CostTracker, LLMClient, ModelCosts, ModelSpec, ModelTier,
    MultiProviderClient, OpenAIClient, Provider, StopReason, TokenUsage, TrackedClient,
};
pub use orchestrator::verify;
pub use progress::{sanitize_data, ProgressEvent, ProgressEventType};
pub use risk::{
    build_report, consistency_score, risk_band, verified_fraction, Finding, FindingStatus,
    MatchStatus, MetricDiff, Report, ReportMetadata, RiskAssessment, RiskLevel, SubScoreCategory,
};
pub use verify::{verify_claim, verify_claims_batched, EvidenceDetail, VerificationEvidence, VerificationVerdict};
