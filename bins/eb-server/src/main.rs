mod connectors;

use clap::Parser;

#[derive(Parser)]
#[command(name = "eb-server", about = "Events-Bridge pipeline runner")]
struct Cli {
    /// Path to the YAML topology file.
    #[arg(long, default_value = "topology.yaml", env = "EB_TOPOLOGY")]
    topology: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    tracing::info!(topology = %cli.topology, "loading topology");
    let config = match eb_engine::TopologyConfig::load(&cli.topology) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load topology");
            std::process::exit(1);
        }
    };

    tracing::info!(pipelines = config.pipelines.len(), "bootstrapping engine");
    let registry = connectors::build_registry();
    let mut engine = match eb_engine::Engine::bootstrap(config, registry).await {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "failed to bootstrap engine");
            std::process::exit(1);
        }
    };

    tracing::info!(pipelines = ?engine.pipeline_names(), "eb-server started, press Ctrl+C to stop");

    let mut sighup = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to register SIGHUP handler");
            std::process::exit(1);
        }
    };
    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to register SIGTERM handler");
            std::process::exit(1);
        }
    };

    loop {
        tokio::select! {
            _ = sighup.recv() => {
                tracing::info!(topology = %cli.topology, "SIGHUP received, reloading topology");
                match engine.reload_from_file(&cli.topology).await {
                    Ok(()) => tracing::info!("topology reloaded successfully"),
                    Err(e) => tracing::error!(error = %e, "topology reload failed (keeping old topology)"),
                }
            }
            _ = sigterm.recv() => {
                tracing::info!("SIGTERM received, shutting down...");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down...");
                break;
            }
        }
    }

    engine.shutdown().await;
}
