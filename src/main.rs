// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Inventory session agent.
//!
//! Restores the persisted session, optionally signs in, then keeps the
//! access token fresh and logs every session change until interrupted.

use std::sync::Arc;

use anyhow::Context;
use inventory_session::{
    config::Config, storage::FileStorage, Credentials, HttpAuthApi, SessionManager,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        api = %config.api_base_url,
        storage_dir = %config.storage_dir.display(),
        "Starting inventory session agent"
    );

    let api = HttpAuthApi::from_config(&config).context("Failed to build auth API client")?;
    let storage = Arc::new(FileStorage::new(&config.storage_dir));
    let manager = SessionManager::new(api, storage, &config);

    manager.restore().await;

    if !manager.is_authenticated() {
        if let (Ok(email), Ok(password)) = (
            std::env::var("SESSION_EMAIL"),
            std::env::var("SESSION_PASSWORD"),
        ) {
            let user = manager
                .login(&Credentials::new(email, password))
                .await
                .context("Login failed")?;
            tracing::info!(user_id = %user.id, name = %user.display_name(), "Signed in");
        }
    }

    let mut updates = manager.subscribe();
    log_view(&manager);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                log_view(&manager);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn log_view(manager: &SessionManager<HttpAuthApi>) {
    let view = manager.view();
    tracing::info!(
        authenticated = view.is_authenticated,
        loading = view.loading,
        user_id = view.user.as_ref().map(|u| u.id.as_str()).unwrap_or("-"),
        access = ?manager.route_access(),
        refresh = ?manager.refresh_state(),
        "Session state"
    );
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("inventory_session=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
