use std::sync::Arc;

use anyhow::Context;
use moviefinder_availability::{AvailabilityConfig, StreamingAvailabilityClient};
use moviefinder_server::auth::generate_auth_token;
use moviefinder_server::config;
use moviefinder_server::state::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init()?;

    let store_config = moviefinder_store::StoreConfig::new(
        config::require_env("SUPA_BASE_URL")?,
        config::require_env("SUPA_AUTH_TOKEN")?,
    );
    let store = moviefinder_store::SupabaseStore::connect(store_config)
        .await
        .context("failed to connect to store")?;
    info!("store connection verified");

    let availability = StreamingAvailabilityClient::new(AvailabilityConfig {
        api_key: config::require_env("RAPID_KEY")?,
    });

    // Without a configured token, mint one so the endpoint is never open.
    let auth_token = match std::env::var("MF_AUTH_TOKEN") {
        Ok(token) => token,
        Err(_) => {
            let token = generate_auth_token(16);
            info!(token = %token, "MF_AUTH_TOKEN not set, generated one for this run");
            token
        }
    };

    let state = AppState {
        auth_token,
        store: Arc::new(store),
        availability: Arc::new(availability),
    };

    let app = moviefinder_server::routes::build_router(state);

    let bind_addr = std::env::var("MF_BIND").unwrap_or_else(|_| "0.0.0.0:8899".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
