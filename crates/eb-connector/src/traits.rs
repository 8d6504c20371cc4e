use std::sync::Arc;

use tokio::sync::mpsc;

use eb_message::{BoxFuture, RunnerMessage};

use crate::error::ConnectorError;

/// A transport adapter that emits incoming events as `RunnerMessage`s.
///
/// The source owns the channel it returns: it MUST close it only after it
/// will produce no further messages, and `produce` MUST return either a
/// live channel or an error but never both.
pub trait Source: Send + Sync {
    fn produce(
        &self,
        buffer_size: usize,
    ) -> BoxFuture<'_, Result<mpsc::Receiver<Arc<RunnerMessage>>, ConnectorError>>;

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>>;
}

/// A stage that transforms a `RunnerMessage` in place.
///
/// `process` mutates `msg`'s local data/metadata. `Ok(())` forwards the
/// message to the next stage; `Err` naks the chain and the message is not
/// forwarded. Only the terminal stage (the target) is permitted to call
/// `ack`/`nak` directly; a mid-chain runner never does.
pub trait Runner: Send + Sync {
    fn process<'a>(&'a self, msg: &'a RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>>;

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>>;
}

/// A transport adapter that forwards a processed `RunnerMessage` outbound.
/// `Ok(())` acks the source message; `Err` naks it.
pub trait Target: Send + Sync {
    fn consume<'a>(&'a self, msg: &'a RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>>;

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>>;
}

/// A read-only or RPC-like capability usable from inside a runner (e.g.
/// issuing commands against an external system from a transformation).
pub trait Service: Send + Sync {
    fn list(&self) -> Vec<String>;

    fn is_valid_method(&self, name: &str, args: &[u8]) -> bool;

    fn call<'a>(&'a self, name: &'a str, args: &'a [u8]) -> BoxFuture<'a, Result<Vec<u8>, ConnectorError>>;

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>>;
}
