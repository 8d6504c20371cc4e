use std::fmt;

/// Which stage of the pipeline raised the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Ill-formed framed record. Fatal for the single message.
    Framing,
    /// Transient transport error surfaced by a source adapter.
    Source,
    /// A runner's `process` returned an error.
    Runner,
    /// A target's `consume` returned an error.
    Target,
    /// A request/response source did not receive reply/ack/nak in time.
    Timeout,
    /// Detected at construction time; prevents pipeline start-up.
    Config,
}

/// Error type returned by every connector trait method.
#[derive(Debug)]
pub struct ConnectorError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ConnectorError {
    pub fn framing(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Framing, message: msg.into() }
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Source, message: msg.into() }
    }

    pub fn runner(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Runner, message: msg.into() }
    }

    pub fn target(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Target, message: msg.into() }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Timeout, message: msg.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    /// Add context, preserving the original `ErrorKind`. Produces
    /// `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ConnectorError {}

impl From<eb_codec::CodecError> for ConnectorError {
    fn from(e: eb_codec::CodecError) -> Self {
        Self::framing(e.to_string())
    }
}

impl From<eb_message::MessageError> for ConnectorError {
    fn from(e: eb_message::MessageError) -> Self {
        Self::source(e.to_string())
    }
}

impl From<std::io::Error> for ConnectorError {
    fn from(e: std::io::Error) -> Self {
        Self::source(e.to_string())
    }
}
