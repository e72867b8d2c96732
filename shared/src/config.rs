use anyhow::{ensure, Context, Result};
use std::time::Duration;

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub sweep: SweepConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            host: std::env::var("DATABASE_HOST").context("DATABASE_HOST is not set")?,
            port: std::env::var("DATABASE_PORT")
                .context("DATABASE_PORT is not set")?
                .parse::<u16>()
                .context("DATABASE_PORT must be a port number")?,
            username: std::env::var("DATABASE_USERNAME")
                .context("DATABASE_USERNAME is not set")?,
            password: std::env::var("DATABASE_PASSWORD")
                .context("DATABASE_PASSWORD is not set")?,
            database: std::env::var("DATABASE_NAME").context("DATABASE_NAME is not set")?,
        };
        let server = ServerConfig {
            port: optional_var("SERVER_PORT", 8080)?,
        };
        let sweep_secs: u64 = optional_var("RESERVATION_SWEEP_INTERVAL_SECS", 60)?;
        ensure!(
            sweep_secs > 0,
            "RESERVATION_SWEEP_INTERVAL_SECS must be greater than zero"
        );
        let sweep = SweepConfig {
            interval: Duration::from_secs(sweep_secs),
        };
        Ok(Self {
            database,
            server,
            sweep,
        })
    }
}

fn optional_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v.parse::<T>().with_context(|| format!("{key} has an invalid value")),
        Err(_) => Ok(default),
    }
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

pub struct ServerConfig {
    pub port: u16,
}

pub struct SweepConfig {
    /// リマインダー・期限切れ判定を走らせる間隔
    pub interval: Duration,
}
