use std::sync::Arc;

use eb_connector::{ConnectorError, Runner};
use eb_message::{BoxFuture, RunnerMessage};

/// Forwards every envelope unchanged.
pub struct IdentityRunner;

impl Runner for IdentityRunner {
    fn process<'a>(&'a self, _msg: &'a RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>> {
        Box::pin(async { Ok(()) })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Fails every envelope with the given message, for exercising runner
/// failures naking the chain.
pub struct FailingRunner {
    message: String,
}

impl FailingRunner {
    pub fn new(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { message: message.into() })
    }
}

impl Runner for FailingRunner {
    fn process<'a>(&'a self, _msg: &'a RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>> {
        Box::pin(async move { Err(ConnectorError::runner(self.message.clone())) })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Uppercases the payload and tags the envelope with `x-upper: true`,
/// standing in for a stdio transform runner without a child process in
/// the loop.
pub struct UppercaseRunner;

impl Runner for UppercaseRunner {
    fn process<'a>(&'a self, msg: &'a RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>> {
        Box::pin(async move {
            let data = msg.get_data().await?;
            let upper = data.to_ascii_uppercase();
            msg.set_data(upper).await;
            msg.add_metadata("x-upper", "true").await;
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Sleeps for `delay` before forwarding, for exercising request/response
/// timeout behavior.
pub struct SleepingRunner {
    delay: std::time::Duration,
}

impl SleepingRunner {
    pub fn new(delay: std::time::Duration) -> Arc<Self> {
        Arc::new(Self { delay })
    }
}

impl Runner for SleepingRunner {
    fn process<'a>(&'a self, _msg: &'a RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(async { Ok(()) })
    }
}
