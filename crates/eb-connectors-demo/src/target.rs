use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, Notify};

use eb_codec::MessageMetadata;
use eb_connector::{ConnectorError, Target};
use eb_message::{BoxFuture, RunnerMessage};

/// A latch that starts closed and, once opened, stays open forever —
/// unlike a bare `Notify`, a waiter that arrives after the open call still
/// passes straight through instead of blocking on a wakeup that already
/// happened.
#[derive(Default)]
pub struct Gate {
    open: AtomicBool,
    notify: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn release(&self) {
        self.open.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    async fn wait(&self) {
        loop {
            // Register interest before re-checking the flag: `notified()`
            // guarantees a notification sent after this call (even if
            // before the first `.await`) is not missed.
            let notified = self.notify.notified();
            if self.open.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

/// A [`Target`] that records every consumed envelope's final metadata and
/// data, optionally gated behind a [`Gate`] so tests can hold it blocked to
/// exercise back-pressure.
pub struct RecordingTarget {
    records: AsyncMutex<Vec<(MessageMetadata, Vec<u8>)>>,
    gate: Option<Arc<Gate>>,
}

impl RecordingTarget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { records: AsyncMutex::new(Vec::new()), gate: None })
    }

    /// Returns a target that blocks inside `consume` until the returned
    /// `Gate` is released.
    pub fn blocking() -> (Arc<Self>, Arc<Gate>) {
        let gate = Gate::new();
        let target = Arc::new(Self { records: AsyncMutex::new(Vec::new()), gate: Some(gate.clone()) });
        (target, gate)
    }

    pub async fn records(&self) -> Vec<(MessageMetadata, Vec<u8>)> {
        self.records.lock().await.clone()
    }
}

impl Target for RecordingTarget {
    fn consume<'a>(&'a self, msg: &'a RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>> {
        Box::pin(async move {
            if let Some(gate) = &self.gate {
                gate.wait().await;
            }
            let metadata = msg.get_metadata().await?;
            let data = msg.get_data().await?;
            self.records.lock().await.push((metadata, data));
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(async { Ok(()) })
    }
}
