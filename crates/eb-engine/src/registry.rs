use std::collections::HashMap;
use std::sync::Arc;

use eb_connector::{Runner, Source, Target};

use crate::config::ConnectorConfig;
use crate::error::EngineError;

pub type SourceFactory = Arc<dyn Fn(&serde_yaml::Value) -> Result<Arc<dyn Source>, EngineError> + Send + Sync>;
pub type RunnerFactory = Arc<dyn Fn(&serde_yaml::Value) -> Result<Arc<dyn Runner>, EngineError> + Send + Sync>;
pub type TargetFactory = Arc<dyn Fn(&serde_yaml::Value) -> Result<Arc<dyn Target>, EngineError> + Send + Sync>;

/// In-process connector construction, keyed by the `kind` string declared
/// in the topology config.
///
/// Connector implementations register a named factory closure instead of
/// being discovered from a dynamically loaded library: Events-Bridge
/// connectors live in-process with the engine, so there is no ABI boundary
/// to cross at connector-construction time.
#[derive(Default)]
pub struct ConnectorRegistry {
    sources: HashMap<String, SourceFactory>,
    runners: HashMap<String, RunnerFactory>,
    targets: HashMap<String, TargetFactory>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_source(&mut self, kind: impl Into<String>, factory: SourceFactory) {
        self.sources.insert(kind.into(), factory);
    }

    pub fn register_runner(&mut self, kind: impl Into<String>, factory: RunnerFactory) {
        self.runners.insert(kind.into(), factory);
    }

    pub fn register_target(&mut self, kind: impl Into<String>, factory: TargetFactory) {
        self.targets.insert(kind.into(), factory);
    }

    pub fn build_source(&self, cfg: &ConnectorConfig) -> Result<Arc<dyn Source>, EngineError> {
        let factory = self.sources.get(&cfg.kind).ok_or_else(|| EngineError::UnknownConnector {
            role: "source",
            kind: cfg.kind.clone(),
        })?;
        factory(&cfg.config)
    }

    pub fn build_runner(&self, cfg: &ConnectorConfig) -> Result<Arc<dyn Runner>, EngineError> {
        let factory = self.runners.get(&cfg.kind).ok_or_else(|| EngineError::UnknownConnector {
            role: "runner",
            kind: cfg.kind.clone(),
        })?;
        factory(&cfg.config)
    }

    pub fn build_target(&self, cfg: &ConnectorConfig) -> Result<Arc<dyn Target>, EngineError> {
        let factory = self.targets.get(&cfg.kind).ok_or_else(|| EngineError::UnknownConnector {
            role: "target",
            kind: cfg.kind.clone(),
        })?;
        factory(&cfg.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eb_connector::ConnectorError;
    use eb_message::BoxFuture;

    struct NoopTarget;
    impl Target for NoopTarget {
        fn consume<'a>(&'a self, _msg: &'a eb_message::RunnerMessage) -> BoxFuture<'a, Result<(), ConnectorError>> {
            Box::pin(async { Ok(()) })
        }
        fn close(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let registry = ConnectorRegistry::new();
        let cfg = ConnectorConfig { kind: "nope".into(), config: serde_yaml::Value::Null };
        assert!(registry.build_target(&cfg).is_err());
    }

    #[test]
    fn registered_factory_is_invoked() {
        let mut registry = ConnectorRegistry::new();
        registry.register_target("noop", Arc::new(|_v| Ok(Arc::new(NoopTarget) as Arc<dyn Target>)));
        let cfg = ConnectorConfig { kind: "noop".into(), config: serde_yaml::Value::Null };
        assert!(registry.build_target(&cfg).is_ok());
    }
}
