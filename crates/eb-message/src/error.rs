use thiserror::Error;

/// Errors surfaced by the message model (C3/C4/C5).
///
/// Transport adapters construct these from their own transport-specific
/// failures; the core only ever matches on the variant.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("failed to read source message metadata: {0}")]
    Metadata(String),

    #[error("failed to read source message data: {0}")]
    Data(String),

    #[error("failed to acknowledge source message: {0}")]
    Ack(String),

    #[error("failed to negatively acknowledge source message: {0}")]
    Nak(String),

    #[error("eb-status value '{0}' is not a decimal integer in [100,599]")]
    InvalidStatus(String),
}
