//! LLM types for requests, responses, and model definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Backend a completion request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Provider {
    /// Messages-API-style backend (system field, required max_tokens).
    Anthropic,
    /// Canonical chat-completions-compatible endpoint.
    OpenAI,
    /// Chat-completions-compatible wire format routed through an aggregator
    /// base URL with optional attribution headers.
    OpenRouter,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAI => write!(f, "openai"),
            Self::OpenRouter => write!(f, "openrouter"),
        }
    }
}

/// Model size class, used to infer the max-output-token policy and the
/// CodeAct batch size `B` (§4.5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Small models: 4,000 max output tokens, batch size 5.
    Small = 0,
    /// Mid-size models: 8,000 max output tokens, batch size 10.
    Mid = 1,
    /// Large (newer-generation) models: up to 16,000 max output tokens,
    /// batch size 20.
    Large = 2,
}

impl ModelTier {
    /// Max-output-token policy inferred from model family (§4.3).
    pub fn default_max_tokens(self) -> u32 {
        match self {
            ModelTier::Small => 4_000,
            ModelTier::Mid => 8_000,
            ModelTier::Large => 16_000,
        }
    }

    /// CodeAct batch size `B` inferred from this tier's max-tokens class
    /// (§4.5.1): 20 for 16k-class, 10 for 8k-class, 5 for 4k-class.
    pub fn codeact_batch_size(self) -> usize {
        match self {
            ModelTier::Small => 5,
            ModelTier::Mid => 10,
            ModelTier::Large => 20,
        }
    }
}

/// Model definition with pricing and capability flags.
///
/// Capability flags are data on the variant, not methods, per the
/// tagged-variants-over-dynamic-dispatch guidance: callers branch on
/// `supports_json_mode` / `tier` rather than asking the model "can you...".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model identifier (e.g., "gpt-4o", "claude-3-5-sonnet-20241022").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub provider: Provider,
    pub tier: ModelTier,
    /// Maximum context window (tokens).
    pub context_window: u32,
    /// Maximum output tokens.
    pub max_output: u32,
    pub input_cost_per_m: f64,
    pub output_cost_per_m: f64,
    /// Whether this backend+model pair supports native JSON mode. The
    /// capability allow-list (§4.3) is checked against this flag before
    /// the gateway attempts structured output.
    pub supports_json_mode: bool,
}

impl ModelSpec {
    /// Calculate cost for given token usage.
    pub fn calculate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input_cost_per_m;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output_cost_per_m;
        input_cost + output_cost
    }
}

/// Well-known models, covering the backends named in §4.3.
impl ModelSpec {
    pub fn claude_sonnet() -> Self {
        Self {
            id: "claude-3-5-sonnet-20241022".to_string(),
            name: "Claude 3.5 Sonnet".to_string(),
            provider: Provider::Anthropic,
            tier: ModelTier::Large,
            context_window: 200_000,
            max_output: 8_192,
            input_cost_per_m: 3.0,
            output_cost_per_m: 15.0,
            supports_json_mode: false,
        }
    }

    pub fn claude_haiku() -> Self {
        Self {
            id: "claude-3-5-haiku-20241022".to_string(),
            name: "Claude 3.5 Haiku".to_string(),
            provider: Provider::Anthropic,
            tier: ModelTier::Mid,
            context_window: 200_000,
            max_output: 8_192,
            input_cost_per_m: 0.8,
            output_cost_per_m: 4.0,
            // Anthropic's Messages API has no response_format parameter;
            // the gateway always uses the fallback extraction path.
            supports_json_mode: false,
        }
    }

    pub fn gpt4o() -> Self {
        Self {
            id: "gpt-4o".to_string(),
            name: "GPT-4o".to_string(),
            provider: Provider::OpenAI,
            tier: ModelTier::Large,
            context_window: 128_000,
            max_output: 16_384,
            input_cost_per_m: 2.5,
            output_cost_per_m: 10.0,
            supports_json_mode: true,
        }
    }

    pub fn gpt4o_mini() -> Self {
        Self {
            id: "gpt-4o-mini".to_string(),
            name: "GPT-4o Mini".to_string(),
            provider: Provider::OpenAI,
            tier: ModelTier::Mid,
            context_window: 128_000,
            max_output: 16_384,
            input_cost_per_m: 0.15,
            output_cost_per_m: 0.60,
            // Observed to misbehave with response_format; on the
            // capability allow-list as "no JSON mode" (§4.3).
            supports_json_mode: false,
        }
    }
}

/// Role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request, as issued to the gateway's single `complete` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: Option<String>,
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub stop: Option<Vec<String>>,
    /// Whether the caller wants a JSON object back (§4.3 "JSON mode").
    pub json_mode: bool,
    pub metadata: Option<HashMap<String, String>>,
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self {
            model: None,
            system: None,
            messages: Vec::new(),
            max_tokens: None,
            temperature: None,
            stop: None,
            json_mode: false,
            metadata: None,
        }
    }
}

impl CompletionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 1.0));
        self
    }

    pub fn with_json_mode(mut self, enable: bool) -> Self {
        self.json_mode = enable;
        self
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub content: String,
    pub stop_reason: Option<StopReason>,
    pub usage: TokenUsage,
    pub timestamp: DateTime<Utc>,
    pub cost: Option<f64>,
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
}

/// Costs for a specific model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCosts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub request_count: u64,
}

/// Cost tracking for a verification run, surfaced in Report metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostTracker {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost: f64,
    pub request_count: u64,
    pub by_model: HashMap<String, ModelCosts>,
}

impl CostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record usage from a completion response.
    pub fn record(&mut self, model: &str, usage: &TokenUsage, cost: Option<f64>) {
        self.total_input_tokens += usage.input_tokens;
        self.total_output_tokens += usage.output_tokens;
        self.request_count += 1;

        if let Some(c) = cost {
            self.total_cost += c;
        }

        let model_costs = self.by_model.entry(model.to_string()).or_default();
        model_costs.input_tokens += usage.input_tokens;
        model_costs.output_tokens += usage.output_tokens;
        model_costs.request_count += 1;
        if let Some(c) = cost {
            model_costs.cost += c;
        }
    }

    /// Merge another tracker into this one.
    pub fn merge(&mut self, other: &CostTracker) {
        self.total_input_tokens += other.total_input_tokens;
        self.total_output_tokens += other.total_output_tokens;
        self.total_cost += other.total_cost;
        self.request_count += other.request_count;

        for (model, costs) in &other.by_model {
            let entry = self.by_model.entry(model.clone()).or_default();
            entry.input_tokens += costs.input_tokens;
            entry.output_tokens += costs.output_tokens;
            entry.cost += costs.cost;
            entry.request_count += costs.request_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_cost_calculation() {
        let sonnet = ModelSpec::claude_sonnet();
        let cost = sonnet.calculate_cost(1_000_000, 500_000);
        assert!((cost - 10.5).abs() < 0.01);
    }

    #[test]
    fn completion_request_builder() {
        let req = CompletionRequest::new()
            .with_model("gpt-4o")
            .with_system("You are a verification agent")
            .with_message(ChatMessage::user("Hi"))
            .with_max_tokens(1000)
            .with_temperature(0.1)
            .with_json_mode(true);

        assert_eq!(req.model, Some("gpt-4o".to_string()));
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.max_tokens, Some(1000));
        assert!(req.json_mode);
    }

    #[test]
    fn cost_tracker_accumulates() {
        let mut tracker = CostTracker::new();
        tracker.record(
            "gpt-4o",
            &TokenUsage {
                input_tokens: 1000,
                output_tokens: 500,
            },
            Some(0.01),
        );
        tracker.record(
            "gpt-4o",
            &TokenUsage {
                input_tokens: 2000,
                output_tokens: 1000,
            },
            Some(0.02),
        );

        assert_eq!(tracker.total_input_tokens, 3000);
        assert_eq!(tracker.request_count, 2);
        assert!((tracker.total_cost - 0.03).abs() < 0.001);
    }

    #[test]
    fn model_tier_batch_sizes() {
        assert_eq!(ModelTier::Small.codeact_batch_size(), 5);
        assert_eq!(ModelTier::Mid.codeact_batch_size(), 10);
        assert_eq!(ModelTier::Large.codeact_batch_size(), 20);
    }

    #[test]
    fn model_tier_ordering() {
        assert!(ModelTier::Small < ModelTier::Mid);
        assert!(ModelTier::Mid < ModelTier::Large);
    }
}
