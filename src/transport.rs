//! Transport seam between the tracer and the remote tracing backend.
//!
//! The tracer delegates every remote call to an injected [`RunTransport`].
//! Both operations are idempotent from the tracer's perspective: retrying a
//! create or update addressed by the same id must not corrupt remote state.
//! Retry/backoff policy and credential handling belong to the transport
//! implementation, not this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::run::{Payload, RunEvent, RunId, RunKind};

/// Request body for run creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunCreate {
    pub id: RunId,
    pub name: String,
    pub run_type: RunKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<RunId>,
    pub inputs: Payload,
    pub start_time: DateTime<Utc>,
}

/// Request body for a run update, addressed by `id`.
///
/// `end_time` is absent for the shutdown flush of a still-open run, which
/// pushes buffered events without closing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunUpdate {
    pub id: RunId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<RunEvent>,
}

impl RunUpdate {
    /// True if this update closes the run (carries an end time).
    pub fn is_terminal(&self) -> bool {
        self.end_time.is_some()
    }
}

/// External collaborator performing the actual create/update calls.
#[async_trait]
pub trait RunTransport: Send + Sync {
    async fn create_run(&self, req: RunCreate) -> Result<(), TransportError>;
    async fn update_run(&self, req: RunUpdate) -> Result<(), TransportError>;
}
