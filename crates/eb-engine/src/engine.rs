use std::collections::HashMap;

use crate::config::TopologyConfig;
use crate::error::EngineError;
use crate::pipeline::Pipeline;
use crate::registry::ConnectorRegistry;

/// The running set of pipelines built from a topology config. Owns nothing
/// but its pipelines and the registry used to build them; it holds no
/// other shared mutable state.
pub struct Engine {
    registry: ConnectorRegistry,
    pipelines: HashMap<String, Pipeline>,
    config: TopologyConfig,
}

impl Engine {
    /// Build every pipeline declared in `config`.
    pub async fn bootstrap(config: TopologyConfig, registry: ConnectorRegistry) -> Result<Self, EngineError> {
        let mut pipelines = HashMap::new();
        for pipeline_cfg in &config.pipelines {
            let pipeline = Pipeline::build(pipeline_cfg.clone(), &registry).await?;
            pipelines.insert(pipeline.name().to_string(), pipeline);
        }
        Ok(Engine { registry, pipelines, config })
    }

    pub fn pipeline_names(&self) -> Vec<&str> {
        self.pipelines.keys().map(String::as_str).collect()
    }

    /// Reload the topology (SIGHUP): pipelines present in both configs and
    /// byte-for-byte unchanged are left running; anything added, removed,
    /// or changed is torn down and/or rebuilt. There is no finer-grained
    /// distinction between restart-required and hot-reloadable fields at
    /// the pipeline level — any change to a pipeline's shape requires
    /// rebuilding it.
    pub async fn reload(&mut self, new_config: TopologyConfig) -> Result<(), EngineError> {
        let mut kept = HashMap::new();

        for new_pipeline_cfg in &new_config.pipelines {
            if let Some(existing) = self.pipelines.remove(&new_pipeline_cfg.name) {
                let old_cfg = self
                    .config
                    .pipelines
                    .iter()
                    .find(|p| p.name == new_pipeline_cfg.name);
                if old_cfg == Some(new_pipeline_cfg) {
                    kept.insert(new_pipeline_cfg.name.clone(), existing);
                    continue;
                }
                tracing::info!(pipeline = %new_pipeline_cfg.name, "rebuilding changed pipeline (reload)");
                existing.shutdown().await;
            } else {
                tracing::info!(pipeline = %new_pipeline_cfg.name, "adding new pipeline (reload)");
            }

            let pipeline = Pipeline::build(new_pipeline_cfg.clone(), &self.registry).await?;
            kept.insert(pipeline.name().to_string(), pipeline);
        }

        for (name, removed) in self.pipelines.drain() {
            tracing::info!(pipeline = %name, "stopping removed pipeline (reload)");
            removed.shutdown().await;
        }

        self.pipelines = kept;
        self.config = new_config;
        tracing::info!("topology reload complete");
        Ok(())
    }

    /// Reload from a YAML file at `path`.
    pub async fn reload_from_file(&mut self, path: &str) -> Result<(), EngineError> {
        let new_config = TopologyConfig::load(path)?;
        self.reload(new_config).await
    }

    /// Graceful shutdown of every pipeline, in no particular order.
    pub async fn shutdown(self) {
        for (name, pipeline) in self.pipelines {
            tracing::info!(pipeline = %name, "shutting down");
            pipeline.shutdown().await;
        }
        tracing::info!("engine shut down");
    }
}
