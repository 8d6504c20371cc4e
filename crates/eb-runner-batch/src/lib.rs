//! A [`Runner`] that groups envelopes into batches instead of calling out
//! once per message.
//!
//! A single background task owns the in-flight batch; `process` only
//! hands it an item and waits on a private oneshot for that item's
//! outcome. The batch flushes when it reaches `batch_size` or when
//! `batch_wait` elapses since the first item of the batch arrived,
//! whichever comes first. An id missing from the batch call's results is
//! naked rather than silently dropped.

mod process_batch;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use eb_codec::MessageMetadata;
use eb_connector::{ConnectorError, Runner};
use eb_message::{BoxFuture, RunnerMessage};

pub use process_batch::process_batch_fn;

/// One envelope handed to a batch call.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: Vec<u8>,
    pub metadata: MessageMetadata,
    pub data: Vec<u8>,
}

/// One envelope's outcome coming back from a batch call. `outcome` is
/// `Err` to nak that specific item without failing the whole batch.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub id: Vec<u8>,
    pub outcome: Result<(MessageMetadata, Vec<u8>), String>,
}

/// Invoked once per flushed batch. An `Err` here naks every item in the
/// batch; per-item failures should instead show up as an `Err` entry in
/// the returned `Vec<BatchResult>`.
pub type BatchFn =
    Arc<dyn Fn(Vec<BatchItem>) -> Pin<Box<dyn Future<Output = Result<Vec<BatchResult>, ConnectorError>> + Send>> + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct BatchRunnerConfig {
    pub batch_size: usize,
    pub batch_wait: Duration,
}

struct PendingItem {
    id: Vec<u8>,
    metadata: MessageMetadata,
    data: Vec<u8>,
    reply_tx: oneshot::Sender<Option<(MessageMetadata, Vec<u8>)>>,
}

pub struct BatchRunner {
    submit_tx: mpsc::Sender<PendingItem>,
    flusher: AsyncMutex<Option<JoinHandle<()>>>,
}

impl BatchRunner {
    pub fn new(config: BatchRunnerConfig, batch_fn: BatchFn) -> Arc<Self> {
        let (submit_tx, submit_rx) = mpsc::channel(config.batch_size.max(1) * 2);
        let flusher = tokio::spawn(run_batcher(submit_rx, config, batch_fn));
        Arc::new(Self {
            submit_tx,
            flusher: AsyncMutex::new(Some(flusher)),
        })
    }
}

impl Runner for BatchRunner {
    fn process<'a>(&'a self, msg: &'a RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>> {
        Box::pin(async move {
            let metadata = msg.get_metadata().await?;
            let data = msg.get_data().await?;
            let id = msg.source().id().to_vec();

            let (reply_tx, reply_rx) = oneshot::channel();
            self.submit_tx
                .send(PendingItem { id, metadata, data, reply_tx })
                .await
                .map_err(|_| ConnectorError::runner("batcher has shut down"))?;

            match reply_rx.await {
                Ok(Some((out_metadata, out_data))) => {
                    msg.merge_metadata(&out_metadata).await;
                    msg.set_data(out_data).await;
                    Ok(())
                }
                Ok(None) => Err(ConnectorError::runner("item absent from batch result")),
                Err(_) => Err(ConnectorError::runner("batcher dropped without responding")),
            }
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(async move {
            if let Some(handle) = self.flusher.lock().await.take() {
                handle.abort();
            }
            Ok(())
        })
    }
}

async fn run_batcher(mut submit_rx: mpsc::Receiver<PendingItem>, config: BatchRunnerConfig, batch_fn: BatchFn) {
    loop {
        let first = match submit_rx.recv().await {
            Some(item) => item,
            None => return,
        };

        let mut pending = vec![first];
        let mut closed = false;
        let deadline = tokio::time::sleep(config.batch_wait);
        tokio::pin!(deadline);

        while pending.len() < config.batch_size {
            tokio::select! {
                biased;
                item = submit_rx.recv() => {
                    match item {
                        Some(item) => pending.push(item),
                        None => { closed = true; break; }
                    }
                }
                _ = &mut deadline => break,
            }
        }

        dispatch(pending, &batch_fn).await;
        if closed {
            return;
        }
    }
}

async fn dispatch(pending: Vec<PendingItem>, batch_fn: &BatchFn) {
    let items: Vec<BatchItem> = pending
        .iter()
        .map(|p| BatchItem { id: p.id.clone(), metadata: p.metadata.clone(), data: p.data.clone() })
        .collect();

    match batch_fn(items).await {
        Ok(results) => {
            let mut by_id: HashMap<Vec<u8>, BatchResult> = results.into_iter().map(|r| (r.id.clone(), r)).collect();
            for item in pending {
                let outcome = by_id.remove(&item.id).and_then(|r| r.outcome.ok());
                let _ = item.reply_tx.send(outcome);
            }
        }
        Err(error) => {
            tracing::warn!(%error, "batch call failed, nak'ing all pending items");
            for item in pending {
                let _ = item.reply_tx.send(None);
            }
        }
    }
}
