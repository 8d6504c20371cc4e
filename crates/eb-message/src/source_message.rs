use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};

use eb_codec::MessageMetadata;

use crate::error::MessageError;
use crate::reply::ReplyData;

/// Boxed future alias, matching the `Pin<Box<dyn Future<...> + Send + '_>>`
/// shape used throughout this workspace's trait objects.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The value a transport adapter delivers for one incoming event.
///
/// `metadata()` and `data()` MUST be idempotent — repeated calls on the same
/// instance return equal values. `ack` and `nak` MUST be mutually exclusive
/// over this message's lifetime; a second call is a no-op, never a panic.
/// [`AckOnce`] is provided so adapters don't have to hand-roll that guard.
pub trait SourceMessage: Send + Sync {
    /// Opaque id; may be empty. Uniqueness is source-defined.
    fn id(&self) -> &[u8];

    fn metadata(&self) -> BoxFuture<'_, Result<MessageMetadata, MessageError>>;

    fn data(&self) -> BoxFuture<'_, Result<Vec<u8>, MessageError>>;

    /// Signal successful processing. `reply` is forwarded to the waiting
    /// handler for request/response transports; fire-and-forget transports
    /// ignore it.
    fn ack(&self, reply: Option<ReplyData>) -> BoxFuture<'_, Result<(), MessageError>>;

    /// Signal failure; the source decides redelivery policy.
    fn nak(&self) -> BoxFuture<'_, Result<(), MessageError>>;
}

/// Reusable single-fire guard for the `ack`/`nak` mutual-exclusion
/// invariant. `begin()` returns `true` exactly once across however many
/// times it's called, from however many threads.
#[derive(Debug, Default)]
pub struct AckOnce(AtomicBool);

impl AckOnce {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Returns `true` if this call is the one that should actually perform
    /// the ack/nak; `false` means a prior call already did, and this one
    /// must be a no-op.
    pub fn begin(&self) -> bool {
        self.0.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok()
    }

    pub fn is_settled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_once_fires_exactly_once() {
        let guard = AckOnce::new();
        assert!(guard.begin());
        assert!(!guard.begin());
        assert!(!guard.begin());
        assert!(guard.is_settled());
    }
}
