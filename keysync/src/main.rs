//! keysync: reconciles a directory of user GPG keys with the user directory.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keysync::clients::{GraphqlUserSource, LocalFs};
use keysync::{Config, KeyDirectory, Runner, RunnerOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keysync=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    info!("Starting keysync");
    info!("Key directory: {}", config.tempdir.display());
    info!("User directory: {}", config.graphql.url);

    let users =
        GraphqlUserSource::new(&config.graphql).context("Failed to build GraphQL client")?;
    let integration = KeyDirectory::new(config.tempdir.clone(), LocalFs, users);

    let mut runner = Runner::new(
        integration,
        RunnerOptions {
            dry_run: config.dry_run,
            run_once: config.run_once,
            interval: config.interval,
        },
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Received Ctrl-C, shutting down");
        signal_token.cancel();
    });

    runner.run(shutdown).await.context("keysync failed")?;

    info!("keysync stopped");
    Ok(())
}
