//! RunTrace - run-tracing client core.
//!
//! Records hierarchical "runs" (spans with inputs, outputs, and events) for
//! chain/tool/model-call executions against a remote tracing backend. The
//! actual network call is delegated to an injected [`RunTransport`]; this
//! crate owns identity, lifecycle, parent/child linkage, event buffering,
//! and failure isolation.
//!
//! # Design Principles
//!
//! - **Best-effort**: tracing outcomes never alter the outcome of the
//!   workload being traced. Transport failures are logged and counted, not
//!   raised.
//! - **Non-blocking**: `begin`/`end` submit fire-and-forget and return
//!   immediately; only usage errors (API misuse) surface to the caller.
//! - **Explicit linkage**: the trace tree is formed by threading returned
//!   `RunId`s into nested `begin` calls, not by call-stack inference, so
//!   concurrent and distributed workloads link correctly.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use runtrace::{RunKind, RunTracer, TracerConfig};
//!
//! # async fn demo(transport: Arc<dyn runtrace::RunTransport>) -> Result<(), runtrace::UsageError> {
//! let tracer = RunTracer::new(transport, TracerConfig::default());
//!
//! let root = tracer.begin("pipeline", RunKind::Chain, Default::default(), None)?;
//! let call = tracer.begin("generate", RunKind::ModelCall, Default::default(), Some(root))?;
//! tracer.add_event(call, "retry", Default::default())?;
//! tracer.complete(call, Default::default())?;
//! tracer.complete(root, Default::default())?;
//!
//! tracer.flush(std::time::Duration::from_secs(2)).await;
//! # Ok(())
//! # }
//! ```

pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod run;
pub mod tracer;
pub mod transport;

pub use diagnostics::{DiagnosticsSnapshot, TracerDiagnostics};
pub use error::{TransportError, UsageError};
pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use run::{Payload, RunEvent, RunId, RunKind, RunState};
pub use tracer::{FlushResult, OpenRun, RunTracer, TracerConfig};
pub use transport::{RunCreate, RunTransport, RunUpdate};
