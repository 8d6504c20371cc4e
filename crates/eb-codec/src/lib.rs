//! The metadata container and the frame codec built on top of it — the
//! wire-level building blocks every other Events-Bridge crate is built on.

pub mod error;
pub mod frame;
pub mod metadata;
pub mod stream;

pub use error::CodecError;
pub use frame::{decode, decode_metadata, encode, encode_metadata, LF, RS, US};
pub use metadata::MessageMetadata;
pub use stream::{decode_stream, FrameChunks, ReadChunks, StreamingDecoder, VecChunks};
