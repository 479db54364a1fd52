use anyhow::{Context, Result};
use catalogue_api::adapters::aws_backends;
use catalogue_api::utils::{logger, validation::Validate};
use catalogue_api::{router, AppConfig, AppState, CliConfig};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliConfig::parse();

    // `.env` is a development convenience only.
    if !is_production_env() {
        let _ = dotenvy::dotenv();
    }

    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting catalogue-api v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::from_env().context("Failed to load config from the environment")?,
    };
    config.apply_cli(&cli);
    config
        .validate()
        .inspect_err(|e| tracing::error!("❌ Configuration validation failed: {}", e))?;

    let backends = aws_backends(&config)
        .await
        .context("Failed to initialise AWS backends")?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let environment = config.environment.clone();
    let app = router(AppState::new(config, backends));

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(environment = %environment, "✅ Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = shutdown_signal().await {
                tracing::error!("Error while waiting for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received, draining connections");
        })
        .await
        .context("HTTP server failed")?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("NODE_ENV"))
        .is_ok_and(|env| matches!(env.as_str(), "prod" | "production"))
}

async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }
    Ok(())
}
