//! A [`Runner`] that applies a JSONLogic rule to the envelope's payload.

use serde_json::{json, Value};

use eb_connector::{ConnectorError, Runner};
use eb_message::{BoxFuture, RunnerMessage};

#[derive(Debug, Clone)]
pub struct JsonLogicRunnerConfig {
    pub rule: Value,
    /// Expose the envelope's metadata to the rule under `$metadata`.
    pub expose_metadata: bool,
    /// Wrap the output as `{"payload": input, "result": output}` instead
    /// of replacing the payload outright.
    pub preserve_payload: bool,
}

pub struct JsonLogicRunner {
    config: JsonLogicRunnerConfig,
}

impl JsonLogicRunner {
    pub fn new(config: JsonLogicRunnerConfig) -> Self {
        Self { config }
    }
}

impl Runner for JsonLogicRunner {
    fn process<'a>(&'a self, msg: &'a RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>> {
        Box::pin(async move {
            let data = msg.get_data().await?;
            let payload: Value =
                serde_json::from_slice(&data).map_err(|e| ConnectorError::runner(format!("payload is not JSON: {e}")))?;

            // The rule always evaluates against `{"payload": ..., "$metadata": ...}`
            // rather than the bare payload, so non-object payloads (arrays,
            // scalars) have a stable shape to expose metadata alongside.
            let metadata_value = if self.config.expose_metadata {
                let metadata = msg.get_metadata().await?;
                Value::Object(metadata.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect())
            } else {
                Value::Null
            };
            let context = json!({ "payload": payload, "$metadata": metadata_value });

            let result = jsonlogic::apply(&self.config.rule, &context)
                .map_err(|e| ConnectorError::runner(format!("jsonlogic evaluation failed: {e}")))?;

            let output = if self.config.preserve_payload {
                json!({ "payload": payload, "result": result })
            } else {
                result
            };

            let bytes = serde_json::to_vec(&output).map_err(|e| ConnectorError::runner(e.to_string()))?;
            msg.set_data(bytes).await;
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

    fn msg_with(data: &[u8]) -> RunnerMessage {
        RunnerMessage::new(Arc::new(FixedMessage { metadata: MessageMetadata::new(), data: data.to_vec() }))
    }

    #[tokio::test]
    async fn applies_rule_and_replaces_payload() {
        let rule = json!({"+": [{"var": "payload.a"}, 1]});
        let runner = JsonLogicRunner::new(JsonLogicRunnerConfig { rule, expose_metadata: false, preserve_payload: false });

        let msg = msg_with(br#"{"a": 41}"#);
        runner.process(&msg).await.unwrap();

        let out: Value = serde_json::from_slice(&msg.get_data().await.unwrap()).unwrap();
        assert_eq!(out, json!(42));
    }

    #[tokio::test]
    async fn preserve_payload_wraps_input_and_output() {
        let rule = json!({"var": "payload.a"});
        let runner = JsonLogicRunner::new(JsonLogicRunnerConfig { rule, expose_metadata: false, preserve_payload: true });

        let msg = msg_with(br#"{"a": "x"}"#);
        runner.process(&msg).await.unwrap();

        let out: Value = serde_json::from_slice(&msg.get_data().await.unwrap()).unwrap();
        assert_eq!(out, json!({"payload": {"a": "x"}, "result": "x"}));
    }

    #[tokio::test]
    async fn non_json_payload_is_a_runner_error() {
        let rule = json!({"var": "payload"});
        let runner = JsonLogicRunner::new(JsonLogicRunnerConfig { rule, expose_metadata: false, preserve_payload: false });

        let msg = msg_with(b"not json");
        assert!(runner.process(&msg).await.is_err());
    }
}
