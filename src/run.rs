//! Run identity and lifecycle types.
//!
//! A run is one recorded execution unit in a trace tree. Runs are related
//! only by parent back-references; the tracer never tracks child lists and
//! the remote system reassembles the tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured key-value payload for run inputs, outputs, and event attributes.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Opaque unique run identifier, generated client-side.
///
/// 128-bit random (UUID v4), so collisions within a tracing session are
/// negligible. The id is the sole addressing key for the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Generate a fresh random run id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classification of a run, controlling how the remote system interprets
/// its inputs and outputs.
///
/// `ModelCall` serializes as `"llm"`, the wire string that unlocks
/// token/usage-aware rendering when payloads follow a recognized
/// message-list shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Chain,
    Tool,
    #[serde(rename = "llm")]
    ModelCall,
    Other,
}

impl RunKind {
    /// The wire string submitted as `run_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Chain => "chain",
            RunKind::Tool => "tool",
            RunKind::ModelCall => "llm",
            RunKind::Other => "other",
        }
    }
}

impl std::fmt::Display for RunKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a run.
///
/// `Open` is initial; exactly one of `Completed`/`Failed` is reached, and
/// no further mutation is permitted afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Open,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// A timestamped annotation attached to a run while it is open.
///
/// Events are buffered in order and flushed with the run's completion
/// update; they are not child runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub name: String,
    pub time: DateTime<Utc>,
    pub attributes: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_ids_are_unique() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn run_id_serializes_transparent() {
        let id = RunId::new();
        let value = serde_json::to_value(id).unwrap();
        assert_eq!(value, json!(id.as_uuid().to_string()));
    }

    #[test]
    fn run_kind_wire_strings() {
        assert_eq!(RunKind::Chain.as_str(), "chain");
        assert_eq!(RunKind::Tool.as_str(), "tool");
        assert_eq!(RunKind::ModelCall.as_str(), "llm");
        assert_eq!(RunKind::Other.as_str(), "other");
    }

    #[test]
    fn run_kind_serde_matches_as_str() {
        for kind in [
            RunKind::Chain,
            RunKind::Tool,
            RunKind::ModelCall,
            RunKind::Other,
        ] {
            let value = serde_json::to_value(kind).unwrap();
            assert_eq!(value, json!(kind.as_str()));
        }
    }

    #[test]
    fn open_is_not_terminal() {
        assert!(!RunState::Open.is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed.is_terminal());
    }
}
