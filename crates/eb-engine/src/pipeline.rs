use std::sync::Arc;

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use eb_connector::{Runner, Source, Target};
use eb_message::RunnerMessage;

use crate::config::PipelineConfig;
use crate::error::EngineError;
use crate::registry::ConnectorRegistry;

type SharedRx = Arc<AsyncMutex<mpsc::Receiver<Arc<RunnerMessage>>>>;

/// One running `source → runner* → target` chain.
///
/// Construction wires a bounded `mpsc` channel between every adjacent
/// pair of stages and spawns `routines` worker tasks per stage, each
/// pulling from a `Mutex`-shared receiver — concurrent workers race for
/// the next message, so there is no ordering guarantee across a stage
/// once `routines > 1`.
pub struct Pipeline {
    name: String,
    source: Arc<dyn Source>,
    runners: Vec<Arc<dyn Runner>>,
    target: Arc<dyn Target>,
    stage_handles: Vec<Vec<JoinHandle<()>>>,
    target_handles: Vec<JoinHandle<()>>,
}

impl Pipeline {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn build(cfg: PipelineConfig, registry: &ConnectorRegistry) -> Result<Self, EngineError> {
        let pipeline_ctx = format!("pipeline '{}'", cfg.name);

        let source = registry.build_source(&cfg.source).map_err(|e| e.with_context(&pipeline_ctx))?;
        let runners: Vec<Arc<dyn Runner>> = cfg
            .runners
            .iter()
            .map(|c| registry.build_runner(c))
            .collect::<Result<_, _>>()
            .map_err(|e| e.with_context(&pipeline_ctx))?;
        let target = registry.build_target(&cfg.target).map_err(|e| e.with_context(&pipeline_ctx))?;

        let source_rx = source
            .produce(cfg.buffer)
            .await
            .map_err(|e| EngineError::from(e).with_context(&pipeline_ctx))?;
        let mut current_rx: SharedRx = Arc::new(AsyncMutex::new(source_rx));

        let mut stage_handles = Vec::with_capacity(runners.len());
        for runner in &runners {
            let (tx, rx) = mpsc::channel(cfg.buffer);
            let next_rx: SharedRx = Arc::new(AsyncMutex::new(rx));

            let mut handles = Vec::with_capacity(cfg.runner_routines);
            for _ in 0..cfg.runner_routines {
                let input = current_rx.clone();
                let output = tx.clone();
                let runner = runner.clone();
                let name = cfg.name.clone();
                handles.push(tokio::spawn(async move {
                    run_runner_stage(&name, input, output, runner).await;
                }));
            }
            stage_handles.push(handles);
            current_rx = next_rx;
        }

        let mut target_handles = Vec::with_capacity(cfg.target_routines);
        for _ in 0..cfg.target_routines {
            let input = current_rx.clone();
            let target = target.clone();
            let name = cfg.name.clone();
            target_handles.push(tokio::spawn(async move {
                run_target_stage(&name, input, target).await;
            }));
        }

        tracing::info!(
            pipeline = %cfg.name,
            runners = runners.len(),
            runner_routines = cfg.runner_routines,
            target_routines = cfg.target_routines,
            "pipeline built"
        );

        Ok(Pipeline {
            name: cfg.name,
            source,
            runners,
            target,
            stage_handles,
            target_handles,
        })
    }

    /// Cooperative shutdown: close the source, wait for each stage's
    /// workers to drain and exit, close that stage's connector, then move
    /// to the next stage. Each connector's `close()` runs only after its
    /// own workers have exited.
    pub async fn shutdown(self) {
        if let Err(e) = self.source.close().await {
            tracing::error!(pipeline = %self.name, error = %e, "source close error");
        }

        for (runner, handles) in self.runners.iter().zip(self.stage_handles.into_iter()) {
            for h in handles {
                let _ = h.await;
            }
            if let Err(e) = runner.close().await {
                tracing::error!(pipeline = %self.name, error = %e, "runner close error");
            }
        }

        for h in self.target_handles {
            let _ = h.await;
        }
        if let Err(e) = self.target.close().await {
            tracing::error!(pipeline = %self.name, error = %e, "target close error");
        }

        tracing::info!(pipeline = %self.name, "pipeline shut down");
    }
}

/// One worker fiber of a runner stage. `process` mutating the envelope and
/// forwarding on success; naking and dropping the message on error. Sending
/// to `output` blocks when the next stage is full — the pipeline's
/// mandatory back-pressure.
async fn run_runner_stage(
    pipeline: &str,
    input: SharedRx,
    output: mpsc::Sender<Arc<RunnerMessage>>,
    runner: Arc<dyn Runner>,
) {
    loop {
        let msg = {
            let mut guard = input.lock().await;
            guard.recv().await
        };
        let Some(msg) = msg else { break };

        match runner.process(&msg).await {
            Ok(()) => {
                if output.send(msg).await.is_err() {
                    tracing::warn!(pipeline, "downstream stage gone, dropping message");
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(pipeline, error = %e, "runner error, nak'ing message");
                if let Err(e) = msg.nak().await {
                    tracing::error!(pipeline, error = %e, "nak failed");
                }
            }
        }
    }
}

/// One worker fiber of the target stage. On success the
/// envelope's current local overlay is carried back to the source as a
/// reply (a no-op ack for transports without a reply channel); on error
/// the source message is naked.
async fn run_target_stage(pipeline: &str, input: SharedRx, target: Arc<dyn Target>) {
    loop {
        let msg = {
            let mut guard = input.lock().await;
            guard.recv().await
        };
        let Some(msg) = msg else { break };

        match target.consume(&msg).await {
            Ok(()) => {
                if let Err(e) = msg.reply().await {
                    tracing::error!(pipeline, error = %e, "ack/reply failed");
                }
            }
            Err(e) => {
                tracing::warn!(pipeline, error = %e, "target error, nak'ing message");
                if let Err(e) = msg.nak().await {
                    tracing::error!(pipeline, error = %e, "nak failed");
                }
            }
        }
    }
}
