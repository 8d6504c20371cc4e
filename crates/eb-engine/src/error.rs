use thiserror::Error;

use eb_connector::ConnectorError;

/// Errors raised while building or running pipelines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config: {0}")]
    Config(String),

    #[error("pipeline '{0}' not found")]
    PipelineNotFound(String),

    #[error("unknown connector kind '{kind}' for {role}")]
    UnknownConnector { role: &'static str, kind: String },

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Add context, preserving the error as a `Config`-flavored message when
    /// it has no inherent kind of its own (mirrors `ConnectorError::with_context`).
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        EngineError::Config(format!("{ctx}: {self}"))
    }
}
