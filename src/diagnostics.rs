//! Diagnostic counters for tracer self-observation.
//!
//! The tracer never raises transport or stale-run conditions into caller
//! code, so this is the channel that makes them observable. Counters are
//! plain atomics; `snapshot` is a point-in-time copy for export.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time copy of all diagnostic counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    /// Remote calls that returned an error from the transport.
    pub transport_failures: u64,
    /// Submissions dropped before reaching the transport (queue full or
    /// dispatch worker gone).
    pub dropped_submissions: u64,
    /// `add_event`/`end` calls against a run already in a terminal state,
    /// absorbed as no-ops.
    pub stale_run_ops: u64,
}

/// Shared counter set; cheap to bump from any thread.
#[derive(Debug, Default)]
pub struct TracerDiagnostics {
    transport_failures: AtomicU64,
    dropped_submissions: AtomicU64,
    stale_run_ops: AtomicU64,
}

impl TracerDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_submission(&self) {
        self.dropped_submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_run_op(&self) {
        self.stale_run_ops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            dropped_submissions: self.dropped_submissions.load(Ordering::Relaxed),
            stale_run_ops: self.stale_run_ops.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let diag = TracerDiagnostics::new();
        let snap = diag.snapshot();
        assert_eq!(snap.transport_failures, 0);
        assert_eq!(snap.dropped_submissions, 0);
        assert_eq!(snap.stale_run_ops, 0);
    }

    #[test]
    fn snapshot_reflects_recorded_counts() {
        let diag = TracerDiagnostics::new();
        diag.record_transport_failure();
        diag.record_transport_failure();
        diag.record_dropped_submission();
        diag.record_stale_run_op();

        let snap = diag.snapshot();
        assert_eq!(snap.transport_failures, 2);
        assert_eq!(snap.dropped_submissions, 1);
        assert_eq!(snap.stale_run_ops, 1);
    }
}
