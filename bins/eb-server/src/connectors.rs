//! Maps connector `kind` strings declared in the topology file onto the
//! in-process adapters this binary ships with. Anyone wiring a new
//! transport or runner into `eb-server` adds a `register_*` call here.

use std::sync::Arc;
use std::time::Duration;

use eb_connector::{Runner, Source, Target};
use eb_engine::{ConnectorRegistry, EngineError};

pub fn build_registry() -> ConnectorRegistry {
    let mut registry = ConnectorRegistry::new();

    registry.register_source("cli-stdin", Arc::new(|_cfg: &serde_yaml::Value| {
        Ok(eb_connectors_demo::CliStdinSource::new() as Arc<dyn Source>)
    }));

    registry.register_target("cli-stdout", Arc::new(|_cfg: &serde_yaml::Value| {
        Ok(eb_connectors_demo::CliStdoutTarget::new() as Arc<dyn Target>)
    }));

    registry.register_runner("identity", Arc::new(|_cfg: &serde_yaml::Value| {
        Ok(Arc::new(eb_connectors_demo::IdentityRunner) as Arc<dyn Runner>)
    }));

    registry.register_runner("uppercase", Arc::new(|_cfg: &serde_yaml::Value| {
        Ok(Arc::new(eb_connectors_demo::UppercaseRunner) as Arc<dyn Runner>)
    }));

    registry.register_runner("process", Arc::new(|cfg: &serde_yaml::Value| {
        let wire: ProcessWireConfig = serde_yaml::from_value(cfg.clone())?;
        Ok(Arc::new(eb_runner_process::ProcessRunner::new(eb_runner_process::ProcessRunnerConfig {
            command: wire.command,
            args: wire.args,
            timeout: Duration::from_secs(wire.timeout_secs),
        })) as Arc<dyn Runner>)
    }));

    registry.register_runner("jsonlogic", Arc::new(|cfg: &serde_yaml::Value| {
        let wire: JsonLogicWireConfig = serde_yaml::from_value(cfg.clone())?;
        let rule = serde_json::to_value(&wire.rule)
            .map_err(|e| EngineError::Config(format!("jsonlogic runner: rule is not representable as JSON: {e}")))?;
        Ok(Arc::new(eb_runner_jsonlogic::JsonLogicRunner::new(eb_runner_jsonlogic::JsonLogicRunnerConfig {
            rule,
            expose_metadata: wire.expose_metadata,
            preserve_payload: wire.preserve_payload,
        })) as Arc<dyn Runner>)
    }));

    registry.register_runner("batch-process", Arc::new(|cfg: &serde_yaml::Value| {
        let wire: BatchProcessWireConfig = serde_yaml::from_value(cfg.clone())?;
        let batch_fn = eb_runner_batch::process_batch_fn(wire.command, wire.args, Duration::from_secs(wire.timeout_secs));
        Ok(eb_runner_batch::BatchRunner::new(
            eb_runner_batch::BatchRunnerConfig {
                batch_size: wire.batch_size,
                batch_wait: Duration::from_millis(wire.batch_wait_ms),
            },
            batch_fn,
        ) as Arc<dyn Runner>)
    }));

    registry
}

#[derive(serde::Deserialize)]
struct ProcessWireConfig {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

#[derive(serde::Deserialize)]
struct JsonLogicWireConfig {
    rule: serde_yaml::Value,
    #[serde(default)]
    expose_metadata: bool,
    #[serde(default)]
    preserve_payload: bool,
}

#[derive(serde::Deserialize)]
struct BatchProcessWireConfig {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default = "default_batch_size")]
    batch_size: usize,
    #[serde(default = "default_batch_wait_ms")]
    batch_wait_ms: u64,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    16
}

fn default_batch_wait_ms() -> u64 {
    100
}
