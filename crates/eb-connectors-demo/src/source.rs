use std::sync::Arc;

use tokio::sync::{mpsc, Mutex as AsyncMutex};

use eb_connector::{ConnectorError, Source};
use eb_message::{BoxFuture, RunnerMessage};

/// An in-process [`Source`] for tests and the demo binary: `submit` feeds
/// envelopes directly, `produce` hands out the receiving end.
///
/// `produce` creates the channel lazily so the contract holds exactly: a
/// live channel comes back only once, and `submit` before the first
/// `produce` call is a source error rather than a silent drop.
pub struct InMemorySource {
    tx: AsyncMutex<Option<mpsc::Sender<Arc<RunnerMessage>>>>,
}

impl InMemorySource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { tx: AsyncMutex::new(None) })
    }

    pub async fn submit(&self, msg: Arc<RunnerMessage>) -> Result<(), ConnectorError> {
        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => tx.send(msg).await.map_err(|_| ConnectorError::source("source channel closed")),
            None => Err(ConnectorError::source("produce() has not been called yet")),
        }
    }
}

impl Source for InMemorySource {
    fn produce(&self, buffer_size: usize) -> BoxFuture<'_, Result<mpsc::Receiver<Arc<RunnerMessage>>, ConnectorError>> {
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(buffer_size);
            *self.tx.lock().await = Some(tx);
            Ok(rx)
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(async move {
            *self.tx.lock().await = None;
            Ok(())
        })
    }
}
