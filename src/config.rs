//! Runtime configuration (§10.3): every knob the pipeline reads, collected
//! once at startup rather than polled mid-run.

use std::env;
use std::path::PathBuf;

use crate::llm::Provider;

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

/// Configuration for a single verification run, built once via
/// [`RuntimeConfig::from_env`] or [`RuntimeConfig::new`] and passed down to
/// every component rather than read from the environment again.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Which backend the gateway (C3) dispatches to.
    pub llm_provider: Provider,
    /// Model id override; falls back to the client's default model.
    pub model: Option<String>,
    /// API key for the selected provider.
    pub api_key: String,
    /// Attribution headers for aggregator backends (e.g. `HTTP-Referer`).
    pub attribution_headers: Vec<(String, String)>,
    /// Path to the structural-grep binary used by the AST search tool (C1).
    /// `None` means "resolve via `which`".
    pub sg_binary_path: Option<PathBuf>,
    /// Repository root the orchestrator searches and verifies against.
    pub workdir: PathBuf,
    /// Bounded worker-pool size for claim extraction (C4).
    /// Env: `CLAIM_EXTRACT_MAX_WORKERS`, default 5.
    pub max_workers: usize,
    /// Per-request timeout for the LLM gateway, in seconds.
    /// Env: `CLAIM_EXTRACT_TIMEOUT_SECONDS`, default 300.
    pub request_timeout_secs: u64,
    /// Whether outbound gateway requests are logged verbatim (debugging
    /// only; may contain model card text). Env: `CLAIM_EXTRACT_LOG_REQUEST`.
    pub log_request_mode: bool,
    /// Whether the claim cache may be redirected into the target repo's
    /// own workspace rather than the pipeline's cache root (§4.2). Default
    /// false: off by default, as a cache write path inside an audited repo
    /// is a surprising side effect to opt into silently.
    pub allow_workspace_override: bool,
    /// Upper bound (inclusive) of the consistency score band classified as
    /// `HIGH` risk.
    pub risk_band_high_max: f64,
    /// Upper bound (inclusive) of the consistency score band classified as
    /// `MEDIUM` risk; anything above is `LOW`.
    pub risk_band_medium_max: f64,
}

impl RuntimeConfig {
    /// Construct directly, bypassing environment variables. Useful for
    /// tests and embedding contexts that already have their own
    /// configuration surface.
    pub fn new(llm_provider: Provider, api_key: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            llm_provider,
            model: None,
            api_key: api_key.into(),
            attribution_headers: Vec::new(),
            sg_binary_path: None,
            workdir: workdir.into(),
            max_workers: 5,
            request_timeout_secs: 300,
            log_request_mode: false,
            allow_workspace_override: false,
            risk_band_high_max: 0.5,
            risk_band_medium_max: 0.8,
        }
    }

    /// Build from environment variables, reading each one exactly once.
    pub fn from_env(llm_provider: Provider, api_key: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            max_workers: env_usize("CLAIM_EXTRACT_MAX_WORKERS", 5),
            request_timeout_secs: env_u64("CLAIM_EXTRACT_TIMEOUT_SECONDS", 300),
            log_request_mode: env_bool("CLAIM_EXTRACT_LOG_REQUEST", false),
            ..Self::new(llm_provider, api_key, workdir)
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_attribution_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attribution_headers.push((key.into(), value.into()));
        self
    }

    pub fn with_sg_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sg_binary_path = Some(path.into());
        self
    }

    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    pub fn with_allow_workspace_override(mut self, allow: bool) -> Self {
        self.allow_workspace_override = allow;
        self
    }

    pub fn with_risk_bands(mut self, high_max: f64, medium_max: f64) -> Self {
        self.risk_band_high_max = high_max;
        self.risk_band_medium_max = medium_max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = RuntimeConfig::new(Provider::Anthropic, "key", "/repo");
        assert_eq!(config.max_workers, 5);
        assert_eq!(config.request_timeout_secs, 300);
        assert!(!config.allow_workspace_override);
        assert_eq!(config.risk_band_high_max, 0.5);
        assert_eq!(config.risk_band_medium_max, 0.8);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = RuntimeConfig::new(Provider::OpenAI, "key", "/repo")
            .with_model("gpt-4o-mini")
            .with_max_workers(10)
            .with_allow_workspace_override(true)
            .with_risk_bands(0.4, 0.75);

        assert_eq!(config.model, Some("gpt-4o-mini".to_string()));
        assert_eq!(config.max_workers, 10);
        assert!(config.allow_workspace_override);
        assert_eq!(config.risk_band_high_max, 0.4);
        assert_eq!(config.risk_band_medium_max, 0.75);
    }

    #[test]
    fn max_workers_is_never_zero() {
        let config = RuntimeConfig::new(Provider::Anthropic, "key", "/repo").with_max_workers(0);
        assert_eq!(config.max_workers, 1);
    }
}
