use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::CodecError;
use crate::frame::decode;
use crate::metadata::MessageMetadata;

/// One-shot decoder: reads `reader` to completion, then decodes it as a
/// single frame — metadata up to the first `LF`, everything after it as
/// payload (single-frame mode).
pub async fn decode_stream<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<(MessageMetadata, Vec<u8>), CodecError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    decode(&buf)
}

/// A single already-demarcated frame chunk, as produced by whatever
/// transport-level framer establishes message boundaries on top of a raw
/// byte stream. That framer (e.g. length-prefixed) is explicitly *not* part
/// of this core — `StreamingDecoder` only consumes its output.
pub trait FrameChunks {
    /// Returns the next complete frame's raw bytes, or `None` at a clean
    /// end of input. Transport-level closed/broken-stream conditions are
    /// expected to surface as `None` here, not as an `Err` — `StreamingDecoder`
    /// only turns a malformed *frame* into `CodecError`.
    fn next_chunk(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>, CodecError>> + Send;
}

/// Incremental frame decoder: pulls one already-demarcated chunk at a time
/// from `S` and decodes it as a frame.
///
/// Terminates cleanly (`Ok(None)`) once `S` is drained. A malformed frame
/// (missing newline, bad metadata) surfaces as `Err` for that call only —
/// the decoder itself does not keep internal buffering state that a bad
/// frame would corrupt for subsequent calls.
pub struct StreamingDecoder<S> {
    chunks: S,
}

impl<S: FrameChunks> StreamingDecoder<S> {
    pub fn new(chunks: S) -> Self {
        Self { chunks }
    }

    /// Decode the next frame, or `None` once the underlying source is drained.
    pub async fn next_frame(&mut self) -> Option<Result<(MessageMetadata, Vec<u8>), CodecError>> {
        match self.chunks.next_chunk().await {
            Ok(None) => None,
            Ok(Some(raw)) => Some(decode(&raw)),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Adapts a raw [`AsyncRead`] into [`FrameChunks`] under the assumption that
/// each individual `read()` call returns exactly one frame's bytes.
///
/// This holds for pipe-based stdio IPC where the peer performs one
/// write-then-flush per message (the stdio runner talks to its child
/// process this way) and payloads are small enough not to split across the
/// pipe buffer. It is a convenience, not a general-purpose multi-frame
/// stream demultiplexer — a real length-prefixed transport should implement
/// [`FrameChunks`] directly instead of going through this adapter.
pub struct ReadChunks<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> ReadChunks<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: vec![0u8; 64 * 1024],
        }
    }
}

impl<R: AsyncRead + Unpin + Send> FrameChunks for ReadChunks<R> {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, CodecError> {
        let n = self.reader.read(&mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf[..n].to_vec()))
    }
}

/// In-memory [`FrameChunks`] source over a fixed list of already-encoded
/// frames — used by tests and by transports that already operate in terms
/// of discrete messages (e.g. a WebSocket frame per Events-Bridge frame).
pub struct VecChunks {
    frames: std::collections::VecDeque<Vec<u8>>,
}

impl VecChunks {
    pub fn new(frames: Vec<Vec<u8>>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl FrameChunks for VecChunks {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, CodecError> {
        Ok(self.frames.pop_front())
    }
}
