// ⚙️ Configuration - read once from the environment at startup

use anyhow::{Context, Result};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_URL: &str = "articles.db";
pub const IN_MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite file path, or `:memory:`
    pub database_url: String,
    /// Production hides internal error details from clients
    pub production: bool,
}

impl Config {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup
    ///
    /// # Variables
    /// - `HOST` (default `0.0.0.0`)
    /// - `PORT` (default `8000`)
    /// - `DATABASE_URL` (default `articles.db`)
    /// - `APP_ENV`, falling back to `NODE_ENV` (default `development`)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT value: {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let environment = lookup("APP_ENV")
            .or_else(|| lookup("NODE_ENV"))
            .unwrap_or_else(|| "development".to_string());

        Ok(Self {
            host,
            port,
            database_url,
            production: environment.trim().eq_ignore_ascii_case("production"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url == IN_MEMORY_DATABASE
    }
}
