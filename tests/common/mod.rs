//! Shared test transports.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use runtrace::{Payload, RunCreate, RunTransport, RunUpdate, TransportError};

/// In-memory transport capturing every call, with switchable failure modes.
#[derive(Default)]
pub struct RecordingTransport {
    creates: Mutex<Vec<RunCreate>>,
    updates: Mutex<Vec<RunUpdate>>,
    fail_creates: AtomicBool,
    fail_updates: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_failing_creates() -> Arc<Self> {
        let transport = Self::default();
        transport.fail_creates.store(true, Ordering::SeqCst);
        Arc::new(transport)
    }

    pub fn creates(&self) -> Vec<RunCreate> {
        self.creates.lock().clone()
    }

    pub fn updates(&self) -> Vec<RunUpdate> {
        self.updates.lock().clone()
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RunTransport for RecordingTransport {
    async fn create_run(&self, req: RunCreate) -> Result<(), TransportError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("backend unreachable".to_string()));
        }
        self.creates.lock().push(req);
        Ok(())
    }

    async fn update_run(&self, req: RunUpdate) -> Result<(), TransportError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(TransportError::Status(503));
        }
        self.updates.lock().push(req);
        Ok(())
    }
}

/// Transport that never completes a call, for drain-timeout tests.
pub struct StallTransport;

#[async_trait]
impl RunTransport for StallTransport {
    async fn create_run(&self, _req: RunCreate) -> Result<(), TransportError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn update_run(&self, _req: RunUpdate) -> Result<(), TransportError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// Build a payload from literal key/value pairs.
pub fn payload(pairs: &[(&str, serde_json::Value)]) -> Payload {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}
