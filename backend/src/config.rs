use std::path::PathBuf;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL URL. When unset the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub seed_file: Option<PathBuf>,
    /// Clear every product before seeding. Destructive, so off unless asked for.
    pub reseed_on_startup: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a valid number")?,
            seed_file: std::env::var("SEED_FILE")
                .ok()
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            reseed_on_startup: std::env::var("RESEED_ON_STARTUP")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("RESEED_ON_STARTUP must be true or false")?,
        })
    }
}
