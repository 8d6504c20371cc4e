use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use eb_codec::MessageMetadata;
use eb_message::{AckOnce, BoxFuture, MessageError, ReplyData, ResponseChannels, SourceMessage};

/// An in-process `SourceMessage` for tests and the stdin/demo connectors.
///
/// Exposes `ack_count`/`nak_count` so tests can assert the exactly-once
/// disposition invariant directly, and optionally carries a
/// [`ResponseChannels`] so request/response scenarios can be driven
/// end-to-end without a real transport.
pub struct DemoSourceMessage {
    id: Vec<u8>,
    data: Vec<u8>,
    metadata: MessageMetadata,
    guard: AckOnce,
    ack_count: AtomicU32,
    nak_count: AtomicU32,
    response: AsyncMutex<Option<ResponseChannels>>,
}

impl DemoSourceMessage {
    pub fn new(id: impl Into<Vec<u8>>, metadata: MessageMetadata, data: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            data: data.into(),
            metadata,
            guard: AckOnce::new(),
            ack_count: AtomicU32::new(0),
            nak_count: AtomicU32::new(0),
            response: AsyncMutex::new(None),
        })
    }

    pub fn with_response(
        id: impl Into<Vec<u8>>,
        metadata: MessageMetadata,
        data: impl Into<Vec<u8>>,
        channels: ResponseChannels,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            data: data.into(),
            metadata,
            guard: AckOnce::new(),
            ack_count: AtomicU32::new(0),
            nak_count: AtomicU32::new(0),
            response: AsyncMutex::new(Some(channels)),
        })
    }

    pub fn ack_count(&self) -> u32 {
        self.ack_count.load(Ordering::SeqCst)
    }

    pub fn nak_count(&self) -> u32 {
        self.nak_count.load(Ordering::SeqCst)
    }
}

impl SourceMessage for DemoSourceMessage {
    fn id(&self) -> &[u8] {
        &self.id
    }

    fn metadata(&self) -> BoxFuture<'_, Result<MessageMetadata, MessageError>> {
        let m = self.metadata.clone();
        Box::pin(async move { Ok(m) })
    }

    fn data(&self) -> BoxFuture<'_, Result<Vec<u8>, MessageError>> {
        let d = self.data.clone();
        Box::pin(async move { Ok(d) })
    }

    fn ack(&self, reply: Option<ReplyData>) -> BoxFuture<'_, Result<(), MessageError>> {
        Box::pin(async move {
            if !self.guard.begin() {
                return Ok(());
            }
            self.ack_count.fetch_add(1, Ordering::SeqCst);
            if let Some(channels) = self.response.lock().await.take() {
                match reply {
                    Some(r) => channels.send_reply(r),
                    None => channels.send_status(true),
                }
            }
            Ok(())
        })
    }

    fn nak(&self) -> BoxFuture<'_, Result<(), MessageError>> {
        Box::pin(async move {
            if !self.guard.begin() {
                return Ok(());
            }
            self.nak_count.fetch_add(1, Ordering::SeqCst);
            if let Some(channels) = self.response.lock().await.take() {
                channels.send_status(false);
            }
            Ok(())
        })
    }
}
