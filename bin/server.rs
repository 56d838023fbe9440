// Articles API - Web Server

use anyhow::{Context, Result};
use articles_api::{build_app, open_database, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "articles_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let conn = open_database(&config)?;
    tracing::info!(database = %config.database_url, "database opened");

    let state = AppState::new(conn, config.production);
    let app = build_app(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(
        %addr,
        production = config.production,
        "articles server listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
