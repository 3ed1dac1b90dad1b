//! cascade-merge - webhook service for cascading release merges

use anyhow::Context;
use cascade_merge::config::Config;
use cascade_merge::git::GitWorkspaces;
use cascade_merge::merge::MergeOrchestrator;
use cascade_merge::platform::BitbucketService;
use cascade_merge::server::{AppState, build_router};
use cascade_merge::worker::{CascadeWorker, IngestionQueue};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cascade_merge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    config.validate().context("invalid configuration")?;

    let workdir = config.workdir();
    tokio::fs::create_dir_all(&workdir)
        .await
        .with_context(|| format!("failed to create work directory {}", workdir.display()))?;

    let hosting = BitbucketService::new(
        &config.api_url,
        &config.bitbucket_username,
        &config.bitbucket_password,
    )?;
    let workspaces = GitWorkspaces::new(&workdir, config.credentials(), config.identity());

    let shutdown = CancellationToken::new();
    let orchestrator = MergeOrchestrator::new(
        Arc::new(hosting),
        Arc::new(workspaces),
        &config.clone_protocol,
    )
    .with_cancellation(shutdown.child_token());

    let (queue, receiver) = IngestionQueue::bounded(config.queue_capacity);
    let worker = CascadeWorker::new(receiver, orchestrator)
        .with_shutdown(shutdown.clone())
        .spawn();

    let app = build_router(AppState::new(queue, config.token.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        %addr,
        workdir = %workdir.display(),
        queue_capacity = config.queue_capacity,
        "cascade-merge listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down");
    shutdown.cancel();
    worker.await.context("cascade worker panicked")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
