use serde::Deserialize;

use crate::error::EngineError;

/// Root pipeline topology, parsed from YAML.
///
/// Only the options named in this struct shape pipeline topology and
/// channel sizing; everything else (addresses, credentials, transform
/// rules, ...) is opaque to the core and lives under each connector's own
/// `config` block.
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyConfig {
    #[serde(default)]
    pub pipelines: Vec<PipelineConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineConfig {
    pub name: String,

    /// Source→runner (and runner→runner, runner→target) channel capacity.
    #[serde(default = "default_buffer")]
    pub buffer: usize,

    /// Workers per runner stage. Must be ≥ 1.
    #[serde(default = "default_routines")]
    pub runner_routines: usize,

    /// Workers in the target stage. Must be ≥ 1.
    #[serde(default = "default_routines")]
    pub target_routines: usize,

    pub source: ConnectorConfig,

    #[serde(default)]
    pub runners: Vec<ConnectorConfig>,

    pub target: ConnectorConfig,
}

/// One connector declaration: a `kind` resolved through a [`crate::registry::ConnectorRegistry`]
/// plus an opaque configuration blob the connector's own factory interprets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectorConfig {
    pub kind: String,
    #[serde(default)]
    pub config: serde_yaml::Value,
}

fn default_buffer() -> usize {
    16
}

fn default_routines() -> usize {
    1
}

impl TopologyConfig {
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(yaml: &str) -> Result<Self, EngineError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EngineError> {
        for pipeline in &self.pipelines {
            pipeline.validate()?;
        }
        let mut seen = std::collections::HashSet::new();
        for pipeline in &self.pipelines {
            if !seen.insert(pipeline.name.as_str()) {
                return Err(EngineError::Config(format!(
                    "duplicate pipeline name '{}'",
                    pipeline.name
                )));
            }
        }
        Ok(())
    }
}

impl PipelineConfig {
    fn validate(&self) -> Result<(), EngineError> {
        if self.runner_routines == 0 {
            return Err(EngineError::Config(format!(
                "pipeline '{}': runner_routines must be >= 1",
                self.name
            )));
        }
        if self.target_routines == 0 {
            return Err(EngineError::Config(format!(
                "pipeline '{}': target_routines must be >= 1",
                self.name
            )));
        }
        Ok(())
    }
}
