use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};

use crate::infrastructure::credentials::DEFAULT_TTL_HOURS;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    pub token_ttl_hours: i64,
}

/// Loads `.env` into the process environment. Runs before logging is set up
/// so a `RUST_LOG` kept in the file takes effect.
pub fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

impl AppConfig {
    /// Reads the process environment; call [`load_env_file`] first.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".into());

        let port = match var("API_PORT").or_else(|| var("PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid API_PORT: {}", e))?,
            None => {
                warn!(port = DEFAULT_PORT, "API_PORT not set, using default");
                DEFAULT_PORT
            }
        };

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => {
                let user = var("DB_USER");
                let password = var("DB_PASSWORD");
                let name = var("DB_NAME");
                let parts = [("DB_USER", &user), ("DB_PASSWORD", &password), ("DB_NAME", &name)];
                for (key, value) in parts {
                    if value.is_none() {
                        warn!(variable = key, "database variable not set");
                    }
                }
                let host = var("DB_HOST").unwrap_or_else(|| "localhost".into());
                let db_port = var("DB_PORT").unwrap_or_else(|| "5432".into());
                format!(
                    "postgres://{}:{}@{}:{}/{}",
                    user.unwrap_or_default(),
                    password.unwrap_or_default(),
                    host,
                    db_port,
                    name.unwrap_or_default()
                )
            }
        };

        let jwt_secret =
            var("JWT_SECRET").ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ORIGIN.into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let token_ttl_hours = match var("TOKEN_TTL_HOURS") {
            Some(raw) => {
                let hours: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid TOKEN_TTL_HOURS: {}", e))?;
                if hours <= 0 {
                    anyhow::bail!("TOKEN_TTL_HOURS must be positive");
                }
                hours
            }
            None => DEFAULT_TTL_HOURS,
        };

        info!(host = %host, port, "configuration loaded");

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            cors_origins,
            token_ttl_hours,
        })
    }
}
