use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;

use crate::reply::ReplyData;

/// Outcome of a request/response source's wait for pipeline disposition:
/// either a plain ack/nak, or a reply to forward to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    Acked,
    Naked,
    Replied(ReplyData),
    /// No disposition arrived before the deadline; the source decides what
    /// status code to return to its caller.
    TimedOut,
}

/// One-shot pair a request/response source hands to the pipeline so it can
/// be told the outcome of the one message it submitted.
///
/// `status_tx` carries plain ack/nak; `reply_tx` carries a reply payload.
/// Exactly one of the two is ever sent, by whichever of `ack`/`nak`/`reply`
/// on the wrapping `RunnerMessage` fires first — downstream senders use
/// [`send_status`]/[`send_reply`], which are no-ops once the receiver side
/// has already been satisfied or dropped.
pub struct ResponseChannels {
    status_tx: oneshot::Sender<bool>,
    reply_tx: oneshot::Sender<ReplyData>,
}

pub struct ResponseWaiter {
    status_rx: oneshot::Receiver<bool>,
    reply_rx: oneshot::Receiver<ReplyData>,
}

/// Build a linked sender/receiver pair for one in-flight request.
pub fn response_channel() -> (ResponseChannels, ResponseWaiter) {
    let (status_tx, status_rx) = oneshot::channel();
    let (reply_tx, reply_rx) = oneshot::channel();
    (
        ResponseChannels { status_tx, reply_tx },
        ResponseWaiter { status_rx, reply_rx },
    )
}

impl ResponseChannels {
    /// Send a plain ack (`true`) or nak (`false`). No-op if the waiter
    /// already received a reply or has been dropped.
    pub fn send_status(self, acked: bool) {
        let _ = self.status_tx.send(acked);
    }

    /// Send a reply payload. No-op if the waiter already received a plain
    /// status or has been dropped.
    pub fn send_reply(self, reply: ReplyData) {
        let _ = self.reply_tx.send(reply);
    }
}

impl ResponseWaiter {
    /// Wait up to `deadline` for whichever of a plain status or a reply
    /// arrives first:
    ///
    /// | event                  | outcome            |
    /// |-------------------------|--------------------|
    /// | `ack()` called          | `Acked`             |
    /// | `nak()` called          | `Naked`             |
    /// | `reply()` called        | `Replied(data)`      |
    /// | neither before deadline | `TimedOut`           |
    pub async fn await_reply_or_status(self, deadline: Duration) -> ResponseStatus {
        let Self { mut status_rx, mut reply_rx } = self;
        let result = timeout(deadline, async {
            tokio::select! {
                biased;
                Ok(reply) = &mut reply_rx => Some(ResponseStatus::Replied(reply)),
                Ok(acked) = &mut status_rx => Some(if acked { ResponseStatus::Acked } else { ResponseStatus::Naked }),
                else => None,
            }
        })
        .await;

        match result {
            Ok(Some(status)) => status,
            Ok(None) => ResponseStatus::TimedOut,
            Err(_) => ResponseStatus::TimedOut,
        }
    }
}
