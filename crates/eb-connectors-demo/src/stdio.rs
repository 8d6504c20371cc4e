use std::io::{BufRead, Write};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex as AsyncMutex};

use eb_codec::MessageMetadata;
use eb_connector::{ConnectorError, Source, Target};
use eb_message::{BoxFuture, RunnerMessage};

use crate::message::DemoSourceMessage;

/// Reads newline-delimited input from stdin and emits one fire-and-forget
/// message per line.
pub struct CliStdinSource {
    task: AsyncMutex<Option<tokio::task::JoinHandle<()>>>,
}

impl CliStdinSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { task: AsyncMutex::new(None) })
    }
}

impl Source for CliStdinSource {
    fn produce(&self, buffer_size: usize) -> BoxFuture<'_, Result<mpsc::Receiver<Arc<RunnerMessage>>, ConnectorError>> {
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(buffer_size);

            let handle = tokio::task::spawn_blocking(move || {
                let stdin = std::io::stdin();
                for (i, line) in stdin.lock().lines().enumerate() {
                    let line = match line {
                        Ok(l) => l,
                        Err(e) => {
                            tracing::error!(error = %e, "stdin read error");
                            break;
                        }
                    };
                    let id = format!("stdin-{i}");
                    let source = DemoSourceMessage::new(id.into_bytes(), MessageMetadata::new(), line.into_bytes());
                    let envelope = Arc::new(RunnerMessage::new(source));
                    if tx.blocking_send(envelope).is_err() {
                        break;
                    }
                }
            });

            *self.task.lock().await = Some(handle);
            Ok(rx)
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(async move {
            if let Some(handle) = self.task.lock().await.take() {
                handle.abort();
            }
            Ok(())
        })
    }
}

/// Writes each envelope's payload to stdout, one line per message.
pub struct CliStdoutTarget;

impl CliStdoutTarget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl Target for CliStdoutTarget {
    fn consume<'a>(&'a self, msg: &'a RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>> {
        Box::pin(async move {
            let data = msg.get_data().await?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data).map_err(|e| ConnectorError::target(e.to_string()))?;
            stdout.write_all(b"\n").map_err(|e| ConnectorError::target(e.to_string()))?;
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(async { Ok(()) })
    }
}
