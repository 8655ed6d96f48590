// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::error::Error;
use std::future::Future;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use vending_machine_server::{
    api::router,
    auth::CredentialAuthority,
    config::{LogFormat, ServerConfig, DEFAULT_LOG_FILTER},
    state::AppState,
    storage::VendingStore,
};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await;
}

/// Resolve once `signal` fires. A listener that fails to install never fires.
async fn wait_for_signal(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing(LogFormat::from_env()?);

    let config = ServerConfig::from_env()?;
    tracing::info!(?config, "configuration loaded");

    let store = VendingStore::open_in_dir(&config.data_dir)?;
    let credentials = CredentialAuthority::new(&config.credentials);
    let app = router(AppState::new(store, credentials));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Vending machine server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
