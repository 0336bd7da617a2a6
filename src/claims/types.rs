//! Claim and chunk types shared across extraction and verification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse category used to route a claim to the right verification
/// strategy (e.g. a performance claim needs a metrics-bearing log or
/// notebook cell; an architecture claim needs the model definition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimCategory {
    Performance,
    Architecture,
    Dataset,
    Training,
    Other,
}

impl ClaimCategory {
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "performance" | "metric" | "metrics" => ClaimCategory::Performance,
            "architecture" | "model" => ClaimCategory::Architecture,
            "dataset" | "data" => ClaimCategory::Dataset,
            "training" | "hyperparameter" | "hyperparameters" => ClaimCategory::Training,
            _ => ClaimCategory::Other,
        }
    }
}

/// A single extracted claim from the model card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: Uuid,
    pub text: String,
    pub category: ClaimCategory,
    /// Index of the source chunk this claim was extracted from, for
    /// tracing a verdict back to the card text that produced it.
    pub source_chunk_index: usize,
    /// Model-reported confidence in having correctly extracted this claim
    /// (distinct from the later verification confidence).
    pub confidence: Option<f64>,
}

impl Claim {
    pub fn new(text: impl Into<String>, category: ClaimCategory, source_chunk_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            category,
            source_chunk_index,
            confidence: None,
        }
    }
}

/// A chunk of the model card's text, produced by the chunker (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    /// Heading path this chunk fell under, if the card was split by
    /// heading (e.g. `["Evaluation", "Results"]`).
    pub heading_path: Vec<String>,
}
