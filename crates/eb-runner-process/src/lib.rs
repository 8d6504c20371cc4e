//! A [`Runner`] that hands the envelope to an external process over stdio,
//! framed with the [`eb_codec`] wire format.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use eb_connector::{ConnectorError, Runner};
use eb_message::{BoxFuture, RunnerMessage};

#[derive(Debug, Clone)]
pub struct ProcessRunnerConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// Frames the envelope's current `(metadata, data)`, writes it to a freshly
/// spawned child process's stdin, closes stdin, and decodes the single
/// frame written back to stdout before the process exits. Metadata from
/// the response is merged onto the envelope (local keys win); the payload
/// replaces the envelope's data.
pub struct ProcessRunner {
    config: ProcessRunnerConfig,
}

impl ProcessRunner {
    pub fn new(config: ProcessRunnerConfig) -> Self {
        Self { config }
    }

    async fn run_once(&self, framed: Vec<u8>) -> Result<(eb_codec::MessageMetadata, Vec<u8>), ConnectorError> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ConnectorError::runner(format!("failed to spawn '{}': {e}", self.config.command)))?;

        let mut stdin = child.stdin.take().expect("stdin was piped");
        stdin
            .write_all(&framed)
            .await
            .map_err(|e| ConnectorError::runner(format!("write to child stdin: {e}")))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ConnectorError::runner(format!("waiting for child: {e}")))?;

        if !output.status.success() {
            return Err(ConnectorError::runner(format!(
                "process '{}' exited with {}: {}",
                self.config.command,
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        eb_codec::decode(&output.stdout).map_err(ConnectorError::from)
    }
}

impl Runner for ProcessRunner {
    fn process<'a>(&'a self, msg: &'a RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>> {
        Box::pin(async move {
            let metadata = msg.get_metadata().await?;
            let data = msg.get_data().await?;
            let framed = eb_codec::encode(&metadata, &data)?;

            let (out_metadata, out_data) = tokio::time::timeout(self.config.timeout, self.run_once(framed))
                .await
                .map_err(|_| ConnectorError::timeout(format!("process runner '{}' timed out", self.config.command)))??;

            msg.merge_metadata(&out_metadata).await;
            msg.set_data(out_data).await;
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eb_codec::MessageMetadata;
    use eb_message::SourceMessage;
    use std::sync::Arc;

    struct FixedMessage {
        metadata: MessageMetadata,
        data: Vec<u8>,
    }

    impl SourceMessage for FixedMessage {
        fn id(&self) -> &[u8] {
            b"fixed"
        }
        fn metadata(&self) -> BoxFuture<'_, Result<MessageMetadata, eb_message::MessageError>> {
            let m = self.metadata.clone();
            Box::pin(async move { Ok(m) })
        }
        fn data(&self) -> BoxFuture<'_, Result<Vec<u8>, eb_message::MessageError>> {
            let d = self.data.clone();
            Box::pin(async move { Ok(d) })
        }
        fn ack(&self, _reply: Option<eb_message::ReplyData>) -> BoxFuture<'_, Result<(), eb_message::MessageError>> {
            Box::pin(async { Ok(()) })
        }
        fn nak(&self) -> BoxFuture<'_, Result<(), eb_message::MessageError>> {
            Box::pin(async { Ok(()) })
        }
    }

    // `cat` copies stdin to stdout verbatim, so the decoded frame on the
    // way out must equal the one sent in.
    #[tokio::test]
    async fn cat_roundtrips_the_frame_unchanged() {
        let metadata: MessageMetadata = [("id".to_string(), "1".to_string())].into_iter().collect();
        let source = Arc::new(FixedMessage { metadata, data: b"hello".to_vec() });
        let msg = RunnerMessage::new(source);

        let runner = ProcessRunner::new(ProcessRunnerConfig {
            command: "cat".to_string(),
            args: vec![],
            timeout: Duration::from_secs(5),
        });

        runner.process(&msg).await.unwrap();
        assert_eq!(msg.get_data().await.unwrap(), b"hello");
        assert_eq!(msg.get_metadata().await.unwrap().get("id"), Some("1"));
    }

    #[tokio::test]
    async fn nonexistent_command_is_a_runner_error() {
        let source = Arc::new(FixedMessage { metadata: MessageMetadata::new(), data: b"x".to_vec() });
        let msg = RunnerMessage::new(source);

        let runner = ProcessRunner::new(ProcessRunnerConfig {
            command: "eb-definitely-not-a-real-binary".to_string(),
            args: vec![],
            timeout: Duration::from_secs(5),
        });

        assert!(runner.process(&msg).await.is_err());
    }
}
