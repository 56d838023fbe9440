// 🌐 Application - shared state and router assembly

use anyhow::{anyhow, Context, Result};
use axum::{middleware, routing::get, Router};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::articles;
use crate::config::Config;
use crate::db::setup_database;
use crate::error::handle_internal_errors;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub production: bool,
}

impl AppState {
    pub fn new(conn: Connection, production: bool) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            production,
        }
    }

    /// Run one database step on the blocking pool
    pub async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| anyhow!("database connection lock poisoned"))?;
            f(&conn)
        })
        .await
        .context("database task failed")?
    }
}

/// Open the configured database and make sure the schema exists
pub fn open_database(config: &Config) -> Result<Connection> {
    let conn = if config.is_in_memory() {
        Connection::open_in_memory()?
    } else {
        Connection::open(&config.database_url)
            .with_context(|| format!("Failed to open database {}", config.database_url))?
    };

    setup_database(&conn)?;
    Ok(conn)
}

/// GET / - Greeting
async fn hello() -> &'static str {
    "Hello, world!"
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .nest("/articles", articles::router())
        .layer(middleware::map_response_with_state(
            state.clone(),
            handle_internal_errors,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root_greeting() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let app = build_app(AppState::new(conn, false));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Hello, world!");
    }

    #[test]
    fn test_open_in_memory_database() {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some(":memory:".to_string()),
            _ => None,
        })
        .unwrap();

        let conn = open_database(&config).unwrap();
        assert_eq!(crate::db::count_articles(&conn).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_with_db_propagates_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(conn, false);

        // No schema yet, so the query fails
        let result = state.with_db(crate::db::count_articles).await;
        assert!(result.is_err());
    }
}
