//! LLM gateway (C3): a provider-agnostic adapter over Anthropic, OpenAI,
//! and OpenAI-compatible aggregators, with JSON-mode-with-fallback
//! structured output and batched execution for claim extraction (C4) and
//! CodeAct verification (C5).
//!
//! ## Example
//!
//! ```rust,ignore
//! use cardcheck_core::llm::{AnthropicClient, ClientConfig, CompletionRequest, ChatMessage, LLMClient};
//!
//! let client = AnthropicClient::new(
//!     ClientConfig::new("your-api-key").with_default_model("claude-3-5-sonnet-20241022"),
//! );
//!
//! let request = CompletionRequest::new().with_message(ChatMessage::user("Hello"));
//! let response = client.complete(request).await?;
//! ```

mod batch;
mod client;
mod parse;
mod types;

pub use batch::{
    BatchConfig, BatchExecutor, BatchQueryResult, BatchedLLMQuery, BatchedQueryResults,
    DEFAULT_MAX_PARALLEL,
};
pub use client::{
    AnthropicClient, ClientConfig, LLMClient, MultiProviderClient, OpenAIClient, TrackedClient,
};
pub use parse::extract_json;
pub use types::{
    ChatMessage, ChatRole, CompletionRequest, CompletionResponse, CostTracker, ModelCosts,
    ModelSpec, ModelTier, Provider, StopReason, TokenUsage,
};
