use std::{str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: Option<String>,
    pub max_connections: u32,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    pub watchdog_interval: Duration,
    /// Consecutive failed pings before the watchdog gives up. `0` disables it.
    pub watchdog_max_failures: u32,
}

impl DbConfig {
    /// Connection options for the pool. `DATABASE_URL` wins over the `DB_*` parts.
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.database_url {
            return PgConnectOptions::from_str(url).context("parse DATABASE_URL");
        }
        let mut opts = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.name)
            .username(&self.user);
        if let Some(password) = &self.password {
            opts = opts.password(password);
        }
        Ok(opts)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    pub host: String,
    pub port: u16,
    /// Adds underlying error text to 5xx bodies.
    pub expose_error_details: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db = DbConfig {
            database_url: var("DATABASE_URL"),
            host: var("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: parse_or(&var, "DB_PORT", 5432)?,
            name: var("DB_NAME").unwrap_or_else(|| "puffrunner_db".into()),
            user: var("DB_USER").unwrap_or_else(|| "postgres".into()),
            password: lookup("DB_PASSWORD"),
            max_connections: parse_or(&var, "DB_POOL_MAX", 20)?,
            idle_timeout: Duration::from_millis(parse_or(&var, "DB_IDLE_TIMEOUT_MS", 30_000)?),
            connect_timeout: Duration::from_millis(parse_or(&var, "DB_CONNECT_TIMEOUT_MS", 2_000)?),
            watchdog_interval: Duration::from_millis(parse_or(
                &var,
                "DB_WATCHDOG_INTERVAL_MS",
                30_000,
            )?),
            watchdog_max_failures: parse_or(&var, "DB_WATCHDOG_MAX_FAILURES", 5)?,
        };

        if db.max_connections == 0 {
            anyhow::bail!("DB_POOL_MAX must be at least 1");
        }

        let port = match var("APP_PORT").or_else(|| var("PORT")) {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("invalid listening port {v:?}"))?,
            None => 3000,
        };

        let expose_error_details = var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        Ok(Self {
            db,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            expose_error_details,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {v:?}")),
        None => Ok(default),
    }
}
