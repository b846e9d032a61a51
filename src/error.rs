//! Error taxonomy for the tracing client.
//!
//! Usage errors surface synchronously to the caller; transport errors are
//! confined to the dispatch worker and the diagnostic channel. Tracing is
//! strictly best-effort with respect to the workload it observes.

use thiserror::Error;

use crate::run::RunId;

/// The caller violated the tracing API contract.
///
/// These indicate a programming mistake in the instrumented code and are
/// the only errors the tracer ever raises into it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("run name must be non-empty")]
    EmptyName,

    #[error("unknown run id: {0}")]
    UnknownRun(RunId),

    #[error("end accepts outputs or an error, not both")]
    ConflictingOutcome,

    #[error("end requires either outputs or an error")]
    MissingOutcome,
}

/// A remote call failed inside a transport implementation.
///
/// Never propagated into the instrumented workload; the dispatch worker
/// logs it and bumps the failure counter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("non-success status: {0}")]
    Status(u16),

    #[error("payload serialization failed: {0}")]
    Serialize(String),
}

impl TransportError {
    /// Returns true if the failure is plausibly transient (logged at `warn`
    /// rather than `error`).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connect(_) => true,
            Self::Status(code) => *code >= 500,
            Self::Serialize(_) => false,
        }
    }
}
