//! Run lifecycle tracking and best-effort dispatch to the transport.
//!
//! `RunTracer` owns the table of in-flight (open) runs and a bounded
//! submission queue drained by a background dispatch task. API methods are
//! synchronous and never await the network: correctness of the trace tree
//! depends only on the caller holding the right `RunId` when it begins
//! children, not on round-trip confirmation.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, warn};

use crate::diagnostics::TracerDiagnostics;
use crate::error::UsageError;
use crate::run::{Payload, RunEvent, RunId, RunKind, RunState};
use crate::transport::{RunCreate, RunTransport, RunUpdate};

/// Tracer configuration value object.
#[derive(Debug, Clone)]
pub struct TracerConfig {
    /// Capacity of the submission queue. Overflow drops the submission
    /// rather than back-pressuring the instrumented workload.
    pub queue_capacity: usize,
    /// How many terminal run ids are remembered so duplicate completions
    /// stay silent no-ops. Ids evicted from this window surface as
    /// `UsageError::UnknownRun` afterwards.
    pub retired_capacity: usize,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            retired_capacity: 1024,
        }
    }
}

/// Outcome of a best-effort flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushResult {
    Complete,
    Timeout { remaining: u32 },
}

/// Summary of a still-open run, for introspection.
#[derive(Debug, Clone)]
pub struct OpenRun {
    pub id: RunId,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub buffered_events: usize,
}

/// Mutable state of an open run. Only the holder of the `RunId` mutates it.
struct RunRecord {
    name: String,
    started_at: DateTime<Utc>,
    events: Vec<RunEvent>,
}

enum Job {
    Create(RunCreate),
    Update(RunUpdate),
}

/// Client-side run tracer.
///
/// Construction spawns the dispatch task, so `new` must be called within a
/// tokio runtime. The transport is injected; no endpoint or credential
/// state lives here.
pub struct RunTracer {
    runs: DashMap<RunId, RunRecord>,
    retired: Mutex<RetiredSet>,
    tx: mpsc::Sender<Job>,
    pending: Arc<AtomicU32>,
    drained: Arc<Notify>,
    diagnostics: Arc<TracerDiagnostics>,
}

impl RunTracer {
    pub fn new(transport: Arc<dyn RunTransport>, config: TracerConfig) -> Self {
        // mpsc::channel panics on zero capacity.
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let pending = Arc::new(AtomicU32::new(0));
        let drained = Arc::new(Notify::new());
        let diagnostics = Arc::new(TracerDiagnostics::new());

        tokio::spawn(dispatch_loop(
            rx,
            transport,
            Arc::clone(&diagnostics),
            Arc::clone(&pending),
            Arc::clone(&drained),
        ));

        Self {
            runs: DashMap::new(),
            retired: Mutex::new(RetiredSet::new(config.retired_capacity)),
            tx,
            pending,
            drained,
            diagnostics,
        }
    }

    /// Open a new run and request its creation remotely.
    ///
    /// Returns the fresh `RunId` immediately; the create call is submitted
    /// fire-and-forget. Thread the returned id into nested `begin` calls as
    /// `parent` to form the trace tree; linkage is explicit because the
    /// workload may be concurrent and there is no single call stack to
    /// infer it from.
    pub fn begin(
        &self,
        name: impl Into<String>,
        kind: RunKind,
        inputs: Payload,
        parent: Option<RunId>,
    ) -> Result<RunId, UsageError> {
        let name = name.into();
        if name.is_empty() {
            return Err(UsageError::EmptyName);
        }

        let id = RunId::new();
        let started_at = Utc::now();
        self.runs.insert(
            id,
            RunRecord {
                name: name.clone(),
                started_at,
                events: Vec::new(),
            },
        );
        debug!(run = %id, name = %name, "run opened");

        self.submit(Job::Create(RunCreate {
            id,
            name,
            run_type: kind,
            parent_run_id: parent,
            inputs,
            start_time: started_at,
        }));
        Ok(id)
    }

    /// Append an event to an open run's buffer.
    ///
    /// No network call; buffered events ride on the completion update. On a
    /// run already terminal this is a silent no-op counted on the
    /// diagnostic channel.
    pub fn add_event(
        &self,
        id: RunId,
        name: impl Into<String>,
        attributes: Payload,
    ) -> Result<(), UsageError> {
        if let Some(mut record) = self.runs.get_mut(&id) {
            record.events.push(RunEvent {
                name: name.into(),
                time: Utc::now(),
                attributes,
            });
            return Ok(());
        }
        if self.retired.lock().get(&id).is_some() {
            self.diagnostics.record_stale_run_op();
            debug!(run = %id, "event on terminal run ignored");
            return Ok(());
        }
        Err(UsageError::UnknownRun(id))
    }

    /// Close a run with exactly one of `outputs` (success) or `error`
    /// (failure) and submit the completion update, carrying the buffered
    /// events in order.
    ///
    /// A second `end` on the same id is a silent no-op; the id is inert
    /// afterwards.
    pub fn end(
        &self,
        id: RunId,
        outputs: Option<Payload>,
        error: Option<String>,
    ) -> Result<(), UsageError> {
        // Contract check first: a usage error must leave run state untouched.
        let state = match (&outputs, &error) {
            (Some(_), Some(_)) => return Err(UsageError::ConflictingOutcome),
            (None, None) => return Err(UsageError::MissingOutcome),
            (Some(_), None) => RunState::Completed,
            (None, Some(_)) => RunState::Failed,
        };

        // Claim the terminal transition under the retired lock: of two
        // racing ends exactly one records its state and submits the update,
        // the other observes the claim and becomes a no-op.
        {
            let mut retired = self.retired.lock();
            if retired.get(&id).is_some() {
                drop(retired);
                self.diagnostics.record_stale_run_op();
                debug!(run = %id, "duplicate end ignored");
                return Ok(());
            }
            if !self.runs.contains_key(&id) {
                return Err(UsageError::UnknownRun(id));
            }
            retired.insert(id, state);
        }
        let Some((_, record)) = self.runs.remove(&id) else {
            // Removal only happens after a successful claim, so the entry
            // cannot vanish between the claim above and this point.
            return Ok(());
        };

        debug!(run = %id, name = %record.name, ?state, "run closed");
        self.submit(Job::Update(RunUpdate {
            id,
            outputs,
            error,
            end_time: Some(Utc::now()),
            events: record.events,
        }));
        Ok(())
    }

    /// Close a run successfully with the given outputs.
    pub fn complete(&self, id: RunId, outputs: Payload) -> Result<(), UsageError> {
        self.end(id, Some(outputs), None)
    }

    /// Close a run as failed with the given error message.
    pub fn fail(&self, id: RunId, error: impl Into<String>) -> Result<(), UsageError> {
        self.end(id, None, Some(error.into()))
    }

    /// Current lifecycle state of a run, if the tracer still remembers it.
    ///
    /// `None` means the id was never issued or its terminal record has been
    /// evicted from the retired window.
    pub fn state(&self, id: RunId) -> Option<RunState> {
        if self.runs.contains_key(&id) {
            return Some(RunState::Open);
        }
        self.retired.lock().get(&id)
    }

    /// Snapshot of all still-open runs.
    pub fn open_runs(&self) -> Vec<OpenRun> {
        self.runs
            .iter()
            .map(|entry| OpenRun {
                id: *entry.key(),
                name: entry.name.clone(),
                started_at: entry.started_at,
                buffered_events: entry.events.len(),
            })
            .collect()
    }

    /// Number of in-flight (open) runs.
    pub fn open_count(&self) -> usize {
        self.runs.len()
    }

    /// Diagnostic counters for conditions absorbed instead of raised.
    pub fn diagnostics(&self) -> &TracerDiagnostics {
        &self.diagnostics
    }

    /// Best-effort flush for shutdown: push buffered events of still-open
    /// runs as non-terminal updates, then wait for the submission queue to
    /// drain, bounded by `timeout`.
    ///
    /// Open runs stay open; closing them remains the caller's job. Never
    /// blocks past the timeout.
    pub async fn flush(&self, timeout: Duration) -> FlushResult {
        for entry in self.runs.iter() {
            if entry.events.is_empty() {
                continue;
            }
            self.submit(Job::Update(RunUpdate {
                id: *entry.key(),
                outputs: None,
                error: None,
                end_time: None,
                events: entry.events.clone(),
            }));
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = self.pending.load(Ordering::SeqCst);
            if remaining == 0 {
                return FlushResult::Complete;
            }
            let left = deadline.saturating_duration_since(tokio::time::Instant::now());
            if left.is_zero() {
                return FlushResult::Timeout { remaining };
            }
            // Short tick alongside the notification covers a wakeup lost
            // between the counter load and registering interest.
            let tick = left.min(Duration::from_millis(25));
            tokio::select! {
                _ = self.drained.notified() => {}
                _ = tokio::time::sleep(tick) => {}
            }
        }
    }

    fn submit(&self, job: Job) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = self.tx.try_send(job) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            self.diagnostics.record_dropped_submission();
            let reason = match err {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "dispatcher stopped",
            };
            warn!(reason, "trace submission dropped");
        }
    }
}

/// Background task draining the submission queue into the transport.
///
/// Transport failures are counted and logged, never propagated: the traced
/// workload's own outcome is unaffected by tracing outcomes.
async fn dispatch_loop(
    mut rx: mpsc::Receiver<Job>,
    transport: Arc<dyn RunTransport>,
    diagnostics: Arc<TracerDiagnostics>,
    pending: Arc<AtomicU32>,
    drained: Arc<Notify>,
) {
    while let Some(job) = rx.recv().await {
        let (run, result) = match job {
            Job::Create(req) => (req.id, transport.create_run(req).await),
            Job::Update(req) => (req.id, transport.update_run(req).await),
        };
        if let Err(err) = result {
            diagnostics.record_transport_failure();
            if err.is_transient() {
                warn!(run = %run, error = %err, "trace submission failed");
            } else {
                error!(run = %run, error = %err, "trace submission failed");
            }
        }
        pending.fetch_sub(1, Ordering::SeqCst);
        drained.notify_waiters();
    }
}

/// Bounded FIFO memory of terminal run ids and their final states.
struct RetiredSet {
    order: VecDeque<RunId>,
    states: HashMap<RunId, RunState>,
    capacity: usize,
}

impl RetiredSet {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity.min(64)),
            states: HashMap::new(),
            capacity,
        }
    }

    fn insert(&mut self, id: RunId, state: RunState) {
        // First terminal state wins; a reinsert must not overwrite it.
        if self.states.contains_key(&id) {
            return;
        }
        self.states.insert(id, state);
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.states.remove(&evicted);
            }
        }
    }

    fn get(&self, id: &RunId) -> Option<RunState> {
        self.states.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retired_set_evicts_oldest() {
        let mut set = RetiredSet::new(2);
        let a = RunId::new();
        let b = RunId::new();
        let c = RunId::new();
        set.insert(a, RunState::Completed);
        set.insert(b, RunState::Failed);
        set.insert(c, RunState::Completed);

        assert_eq!(set.get(&a), None);
        assert_eq!(set.get(&b), Some(RunState::Failed));
        assert_eq!(set.get(&c), Some(RunState::Completed));
    }

    #[test]
    fn retired_set_reinsert_keeps_first_state() {
        let mut set = RetiredSet::new(4);
        let id = RunId::new();
        set.insert(id, RunState::Completed);
        set.insert(id, RunState::Failed);
        assert_eq!(set.get(&id), Some(RunState::Completed));
        assert_eq!(set.order.len(), 1);
    }
}
