use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use api_kit::{with_http_layers, HttpLayersCfg};
use reports::ReportsModule;
use runtime::{AppConfig, CliArgs};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{db, shutdown};

/// Connect, bootstrap the reports tables and serve until a shutdown signal.
pub async fn run(config: AppConfig, args: CliArgs) -> Result<()> {
    let cancel = CancellationToken::new();
    spawn_signal_watcher(cancel.clone());

    let base_dir = PathBuf::from(&config.server.home_dir);
    let conn = db::connect(config.database.as_ref(), &base_dir, args.mock).await?;

    let reports = ReportsModule::new(conn.clone(), config.reports.clone(), cancel.clone());
    reports.migrate().await?;
    if args.mock {
        reports.seed_demo().await?;
    }

    let layers = HttpLayersCfg {
        timeout: (config.server.timeout_sec > 0)
            .then(|| Duration::from_secs(config.server.timeout_sec)),
        ..HttpLayersCfg::default()
    };
    let router = with_http_layers(reports.router(), &layers);

    let addr = (config.server.host.as_str(), config.server.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}:{}", addr.0, addr.1))?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP server listening");

    let stop = cancel.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { stop.cancelled().await })
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped, closing database");
    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "database close failed");
    }
    Ok(())
}

fn spawn_signal_watcher(cancel: CancellationToken) {
    tokio::spawn(async move {
        match shutdown::wait_for_shutdown().await {
            Ok(()) => tracing::info!("shutdown: signal received"),
            Err(e) => tracing::warn!(error = %e, "shutdown: signal handler failed, stopping"),
        }
        cancel.cancel();
    });
}
