use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use eb_codec::MessageMetadata;

use crate::error::MessageError;
use crate::reply::ReplyData;
use crate::source_message::SourceMessage;

/// Locally-overridden state a `RunnerMessage` carries on top of its
/// wrapped `SourceMessage`. Both fields guarded by one lock so a reader
/// never observes a torn mutation.
#[derive(Default)]
struct LocalState {
    data: Option<Vec<u8>>,
    metadata: Option<MessageMetadata>,
}

/// Mutable envelope wrapping exactly one [`SourceMessage`], mutated in
/// place by each runner in a chain and finally read by the target.
///
/// Created by the source adapter at message arrival, mutated by any number
/// of runners in sequence, read by the target, dropped once the pipeline
/// has ack'd or nak'd the underlying source message.
pub struct RunnerMessage {
    source: Arc<dyn SourceMessage>,
    local: AsyncMutex<LocalState>,
}

impl RunnerMessage {
    pub fn new(source: Arc<dyn SourceMessage>) -> Self {
        Self {
            source,
            local: AsyncMutex::new(LocalState::default()),
        }
    }

    pub fn source(&self) -> &Arc<dyn SourceMessage> {
        &self.source
    }

    /// Always delegates to the wrapped source, bypassing local overrides.
    pub async fn get_source_data(&self) -> Result<Vec<u8>, MessageError> {
        self.source.data().await
    }

    /// Always delegates to the wrapped source, bypassing local overrides.
    pub async fn get_source_metadata(&self) -> Result<MessageMetadata, MessageError> {
        self.source.metadata().await
    }

    /// `localData` if set, otherwise the source payload.
    pub async fn get_data(&self) -> Result<Vec<u8>, MessageError> {
        let guard = self.local.lock().await;
        if let Some(ref data) = guard.data {
            return Ok(data.clone());
        }
        drop(guard);
        self.source.data().await
    }

    /// Source metadata with `localMetadata` merged on top (local keys win).
    pub async fn get_metadata(&self) -> Result<MessageMetadata, MessageError> {
        let source_metadata = self.source.metadata().await?;
        let guard = self.local.lock().await;
        Ok(match MessageMetadata::overlaid(Some(&source_metadata), guard.metadata.as_ref()) {
            Some(m) => m,
            None => source_metadata,
        })
    }

    /// Replace the local payload override.
    pub async fn set_data(&self, data: Vec<u8>) {
        let mut guard = self.local.lock().await;
        guard.data = Some(data);
    }

    /// Insert a single local metadata entry, creating the local overlay if absent.
    pub async fn add_metadata(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut guard = self.local.lock().await;
        guard.metadata.get_or_insert_with(MessageMetadata::new).insert(key, value);
    }

    /// Replace the local metadata overlay wholesale.
    pub async fn set_metadata(&self, metadata: MessageMetadata) {
        let mut guard = self.local.lock().await;
        guard.metadata = Some(metadata);
    }

    /// Shallow-merge `metadata` into the local overlay, last-writer-wins
    /// (`metadata`'s entries win).
    pub async fn merge_metadata(&self, metadata: &MessageMetadata) {
        let mut guard = self.local.lock().await;
        guard.metadata.get_or_insert_with(MessageMetadata::new).merge(metadata);
    }

    /// Delegates to the wrapped source exactly once per invocation; the
    /// source itself enforces the ack/nak mutual-exclusion invariant.
    pub async fn ack(&self) -> Result<(), MessageError> {
        self.source.ack(None).await
    }

    pub async fn nak(&self) -> Result<(), MessageError> {
        self.source.nak().await
    }

    /// Build a `ReplyData` from the current local overlay (data/metadata
    /// may each be absent) and ack the source with it. A source with no
    /// reply channel treats this as a permitted no-op.
    pub async fn reply(&self) -> Result<(), MessageError> {
        let guard = self.local.lock().await;
        let metadata = guard.metadata.clone().unwrap_or_default();
        let data = guard.data.clone().unwrap_or_default();
        drop(guard);
        self.source.ack(Some(ReplyData::new(metadata, data))).await
    }
}
