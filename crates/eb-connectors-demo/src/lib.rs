//! In-process connectors used to exercise the pipeline executor end to
//! end, and a minimal CLI stdin/stdout transport pair for the demo binary.

mod message;
mod runners;
mod source;
mod stdio;
mod target;

pub use message::DemoSourceMessage;
pub use runners::{FailingRunner, IdentityRunner, SleepingRunner, UppercaseRunner};
pub use source::InMemorySource;
pub use stdio::{CliStdinSource, CliStdoutTarget};
pub use target::{Gate, RecordingTarget};
