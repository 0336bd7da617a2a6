//! Progress-event stream emitted by the orchestrator (§4.7, §6): a finite
//! ordered sequence of small, sanitized events, terminated by exactly one
//! `complete` (carrying the Report) or `error` event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys an event's `data` object is allowed to carry once sanitized.
/// Anything outside this allow-list (claim lists, evidence tables, full
/// Match vectors) is stripped to a count before the event leaves the
/// orchestrator, bounding per-event payload size (§4.7).
const DATA_ALLOW_LIST: &[&str] = &[
    "chunks", "chunk_index", "claims", "claim_count", "batch", "batches",
    "risk_band", "provider", "model", "phase",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventType {
    Progress,
    Complete,
    Error,
}

/// One event in the stream. `data` has already been run through
/// [`sanitize_data`] by the time an event is constructed via the
/// convenience constructors below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub event_type: ProgressEventType,
    pub message: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn progress(message: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: ProgressEventType::Progress,
            message: message.into(),
            data: sanitize_data(data),
            timestamp: Utc::now(),
        }
    }

    /// The terminal `complete` event. Unlike `progress`/`error`, its data
    /// is not sanitized — it is the one place the full Report travels
    /// (§4.7: "only the final complete carries the full Report").
    pub fn complete(report: Value) -> Self {
        Self {
            event_type: ProgressEventType::Complete,
            message: "verification complete".to_string(),
            data: report,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            event_type: ProgressEventType::Error,
            message: message.into(),
            data: Value::Object(serde_json::Map::new()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.event_type, ProgressEventType::Complete | ProgressEventType::Error)
    }
}

/// Strip a `data` object down to the allow-listed keys, replacing any
/// array-valued field not on the allow-list with its length so large
/// payloads never leave the orchestrator in a progress event.
pub fn sanitize_data(data: Value) -> Value {
    match data {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, value) in map {
                if DATA_ALLOW_LIST.contains(&key.as_str()) {
                    sanitized.insert(key, value);
                } else if let Value::Array(items) = &value {
                    sanitized.insert(format!("{key}_count"), Value::from(items.len()));
                }
            }
            Value::Object(sanitized)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_listed_keys_survive_sanitization() {
        let data = serde_json::json!({"chunks": 4, "claims": [1, 2, 3]});
        let sanitized = sanitize_data(data);
        assert_eq!(sanitized["chunks"], 4);
    }

    #[test]
    fn non_allow_listed_arrays_are_reduced_to_counts() {
        let data = serde_json::json!({"claim_list": [1, 2, 3, 4]});
        let sanitized = sanitize_data(data);
        assert!(sanitized.get("claim_list").is_none());
        assert_eq!(sanitized["claim_list_count"], 4);
    }

    #[test]
    fn non_allow_listed_scalars_are_dropped() {
        let data = serde_json::json!({"secret_path": "/etc/passwd"});
        let sanitized = sanitize_data(data);
        assert_eq!(sanitized, serde_json::json!({}));
    }

    #[test]
    fn complete_event_is_terminal_and_carries_full_payload() {
        let report = serde_json::json!({"claims": [1, 2, 3], "consistency_score": 0.8});
        let event = ProgressEvent::complete(report.clone());
        assert!(event.is_terminal());
        assert_eq!(event.data, report);
    }
}
