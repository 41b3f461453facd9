mod client;
mod config;
mod error;
mod forward;
mod hooks;
mod http_server;
mod processor;
mod types;
mod verification;

#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result};
use client::{SheetApi, SmartsheetClient};
use config::Config;
use forward::{ProcessForwarder, RowForwarder};
use http_server::{ServerState, SharedSecret};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use types::SheetId;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = Config::load(&config_path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = config::port_from_env(std::env::var("PORT").ok())?;

    let token = config.access_token(std::env::var("SMARTSHEET_ACCESS_TOKEN").ok());
    if token.is_none() {
        tracing::warn!("no access token configured; API calls will be rejected");
    }
    let api: Arc<dyn SheetApi> = Arc::new(SmartsheetClient::new(&config.api_base_url, token));
    let forwarder: Arc<dyn RowForwarder> = Arc::new(ProcessForwarder::new(&config.handler));

    let relay = run(&config, api, forwarder, SocketAddr::from(([0, 0, 0, 0], port))).await?;
    if relay.shared_secret.read().await.is_none() {
        tracing::warn!("no shared secret known; callbacks will not be signature-checked");
    }

    relay.server.await.context("HTTP server task failed")?;
    Ok(())
}

/// A relay that is listening for callbacks.
struct Relay {
    server: JoinHandle<()>,
    shared_secret: SharedSecret,
}

/// Probe the sheet, start listening on `addr`, then reconcile the hook.
///
/// The listener must be up before reconciliation, since enabling the hook
/// makes Smartsheet send a verification challenge. Only a failed bind is
/// fatal.
async fn run(
    config: &Config,
    api: Arc<dyn SheetApi>,
    forwarder: Arc<dyn RowForwarder>,
    addr: SocketAddr,
) -> Result<Relay> {
    probe_sheet(api.as_ref(), config.sheet_id).await;

    let shared_secret: SharedSecret = Arc::new(RwLock::new(config.shared_secret.clone()));
    let state = ServerState::new(api.clone(), forwarder, config.sheet_id, shared_secret.clone());
    let (_, server) = http_server::start(addr, state)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let hook = hooks::initialize_hook(
        api.as_ref(),
        config.sheet_id,
        &config.webhook_name,
        &config.callback_url,
    )
    .await;

    // A configured secret wins over the one reported by the API.
    if let Some(secret) = hook.and_then(|h| h.shared_secret) {
        let mut current = shared_secret.write().await;
        if current.is_none() {
            tracing::info!("verifying callbacks with the hook's shared secret");
            *current = Some(secret);
        }
    }

    Ok(Relay {
        server,
        shared_secret,
    })
}

/// Check that the sheet is reachable with the configured token.
async fn probe_sheet(api: &dyn SheetApi, sheet_id: SheetId) {
    tracing::info!("Checking for sheet id: {sheet_id}");
    match api.get_sheet(sheet_id).await {
        Ok(sheet) => tracing::info!(
            "Found sheet: \"{}\" at {}",
            sheet.name,
            sheet.permalink.as_deref().unwrap_or("(no permalink)")
        ),
        Err(e) => tracing::error!(sheet_id, "sheet probe failed: {e}"),
    }
}
