//! Builds a [`BatchFn`] that hands each item of a flushed batch to an
//! external process, one invocation per item, over the same stdio framing
//! [`eb_runner_process`](../../eb-runner-process) uses for single messages.
//!
//! Grouping happens at the batcher level ([`crate::BatchRunner`]); this
//! just supplies what a batch call actually does when the batcher flushes.
//! A per-item failure naks that item alone rather than the whole batch.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use eb_connector::ConnectorError;

use crate::{BatchFn, BatchItem, BatchResult};

pub fn process_batch_fn(command: String, args: Vec<String>, timeout: Duration) -> BatchFn {
    std::sync::Arc::new(move |items: Vec<BatchItem>| {
        let command = command.clone();
        let args = args.clone();
        Box::pin(async move {
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                let outcome = run_one(&command, &args, timeout, &item).await;
                results.push(BatchResult {
                    id: item.id,
                    outcome: outcome.map_err(|e| e.to_string()),
                });
            }
            Ok(results)
        })
    })
}

async fn run_one(
    command: &str,
    args: &[String],
    timeout: Duration,
    item: &BatchItem,
) -> Result<(eb_codec::MessageMetadata, Vec<u8>), ConnectorError> {
    let framed = eb_codec::encode(&item.metadata, &item.data)?;
    tokio::time::timeout(timeout, spawn_and_run(command, args, framed))
        .await
        .map_err(|_| ConnectorError::timeout(format!("batch item timed out calling '{command}'")))?
}

async fn spawn_and_run(
    command: &str,
    args: &[String],
    framed: Vec<u8>,
) -> Result<(eb_codec::MessageMetadata, Vec<u8>), ConnectorError> {
    let mut child = Command::new(command)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ConnectorError::runner(format!("failed to spawn '{command}': {e}")))?;

    let mut stdin = child.stdin.take().expect("stdin was piped");
    stdin.write_all(&framed).await.map_err(|e| ConnectorError::runner(format!("write to child stdin: {e}")))?;
    drop(stdin);

    let output = child.wait_with_output().await.map_err(|e| ConnectorError::runner(format!("waiting for child: {e}")))?;
    if !output.status.success() {
        return Err(ConnectorError::runner(format!(
            "process '{command}' exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    eb_codec::decode(&output.stdout).map_err(ConnectorError::from)
}
