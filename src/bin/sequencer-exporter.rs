use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sequencer_exporter::config::{Config, Settings};
use sequencer_exporter::metrics::ExporterMetrics;
use sequencer_exporter::scrape_engine::ScrapeEngine;
use sequencer_exporter::{sequencer, server, wallet};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("🚀 Starting sequencer exporter");

    let settings = Settings::from_env()?;
    let config = Config::load(&settings.config_path)?;
    info!("📋 Configuration loaded from {}", settings.config_path);

    let registry = prometheus::Registry::new();
    let metrics = ExporterMetrics::register(&registry)?;

    let cancel = CancellationToken::new();
    let mut engines = Vec::new();

    let (head, epoch, dtl) = sequencer::build_families(&config, &metrics).await?;
    let sequencer_interval = settings.sequencer_interval();
    engines.push(tokio::spawn(
        ScrapeEngine::new(
            Arc::new(head),
            sequencer_interval,
            metrics.failures.clone(),
            cancel.clone(),
        )
        .run(),
    ));
    engines.push(tokio::spawn(
        ScrapeEngine::new(
            Arc::new(epoch),
            sequencer_interval,
            metrics.failures.clone(),
            cancel.clone(),
        )
        .run(),
    ));
    engines.push(tokio::spawn(
        ScrapeEngine::new(
            Arc::new(dtl),
            sequencer_interval,
            metrics.failures.clone(),
            cancel.clone(),
        )
        .run(),
    ));

    if let Some(section) = &config.wallet {
        let (l2_wallet, l1_wallet) = wallet::build_families(section, &metrics).await?;
        let wallet_interval = settings.wallet_interval();
        engines.push(tokio::spawn(
            ScrapeEngine::new(
                Arc::new(l2_wallet),
                wallet_interval,
                metrics.failures.clone(),
                cancel.clone(),
            )
            .run(),
        ));
        engines.push(tokio::spawn(
            ScrapeEngine::new(
                Arc::new(l1_wallet),
                wallet_interval,
                metrics.failures.clone(),
                cancel.clone(),
            )
            .run(),
        ));
    } else {
        warn!("no wallet section configured, wallet families not started");
    }

    let listen = SocketAddr::from(([0, 0, 0, 0], settings.metrics_port));
    let (addr, serve) = server::bind(listen, registry.clone(), cancel.clone())?;
    info!("📊 Metrics server listening on http://{}", addr);
    let server_handle = tokio::spawn(serve);

    wait_for_shutdown().await?;
    info!("🛑 Shutdown signal received");
    cancel.cancel();

    futures::future::join_all(engines).await;
    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!("metrics server error: {}", err),
        Err(err) => error!("metrics server task failed: {}", err),
    }

    info!("👋 Sequencer exporter stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
