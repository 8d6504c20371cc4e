//! In-flight event envelope and the request/response disposition plumbing
//! built on top of [`eb_codec`]'s wire format (C3, C4, C5).

mod error;
mod reply;
mod response;
mod runner_message;
mod source_message;

pub use error::MessageError;
pub use reply::{ReplyData, RESERVED_PREFIX, STATUS_KEY};
pub use response::{response_channel, ResponseChannels, ResponseStatus, ResponseWaiter};
pub use runner_message::RunnerMessage;
pub use source_message::{AckOnce, BoxFuture, SourceMessage};
