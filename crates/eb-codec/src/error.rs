use thiserror::Error;

/// Errors raised while encoding or decoding a framed `(metadata, payload)` record.
///
/// Mirrors the error-kind tagging used throughout the rest of this workspace
/// (`ConnectorError`, `EngineError`): callers match on variant, not on message text.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("metadata key or value '{0}' contains a reserved separator byte (0x0A, 0x1E or 0x1F)")]
    ReservedByte(String),

    #[error("framing error: missing newline terminator between metadata and payload")]
    MissingNewline,

    #[error("framing error: metadata entry '{0}' is missing the key/value separator")]
    MissingKvSeparator(String),

    #[error("framing error: metadata entry '{0}' has more than one key/value separator")]
    ExtraKvSeparator(String),

    #[error("framing error: metadata bytes are not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("i/o error while decoding a frame: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream ended mid-frame")]
    UnexpectedEof,
}
