use axum::extract::FromRef;

mod accounts;
mod admin;
mod app;
mod auth;
mod catalog;
mod config;
mod db;
mod error;
mod extract;
mod memory;
mod purchases;
mod state;

use crate::{catalog::services::CatalogService, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "storefront=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;
    tracing::info!(
        token_ttl_minutes = app_state.config.jwt.ttl_minutes,
        "configuration loaded"
    );

    // Idempotent: only fills an empty catalog.
    if let Err(e) = CatalogService::from_ref(&app_state).seed().await {
        tracing::warn!(error = %e, "catalog seeding failed; continuing");
    }

    let addr = app_state.config.bind_addr()?;
    app::serve(app::build_app(app_state), addr).await
}
