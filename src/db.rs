use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{error, info, warn};

use crate::config::DbConfig;

/// Builds the process-wide pool. Connections are opened on first use, so the
/// service can start (and report `disconnected`) while the database is down.
pub fn build_pool(cfg: &DbConfig) -> anyhow::Result<PgPool> {
    let opts = cfg.connect_options()?;
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .idle_timeout(Some(cfg.idle_timeout))
        .acquire_timeout(cfg.connect_timeout)
        .connect_lazy_with(opts);
    info!(
        max_connections = cfg.max_connections,
        idle_timeout_ms = cfg.idle_timeout.as_millis() as u64,
        connect_timeout_ms = cfg.connect_timeout.as_millis() as u64,
        "database pool configured"
    );
    Ok(pool)
}

/// One `SELECT 1` round trip on a pooled connection.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    sqlx::query("SELECT 1").execute(&mut *conn).await?;
    Ok(())
}

/// Logs whether the database answers and whether the `signups` table exists.
/// Never fails: the service keeps running and health reports the state.
pub async fn verify_startup(pool: &PgPool) {
    let mut conn = match pool.acquire().await {
        Ok(c) => c,
        Err(e) => {
            error!(
                error = %e,
                "cannot connect to the database; check that PostgreSQL is running, \
                 the credentials are correct and the database exists"
            );
            return;
        }
    };

    if let Err(e) = sqlx::query("SELECT NOW()").execute(&mut *conn).await {
        error!(error = %e, "database did not answer the startup query");
        return;
    }
    info!("database connection verified");

    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = 'signups'
        )
        "#,
    )
    .fetch_one(&mut *conn)
    .await;

    match exists {
        Ok(true) => info!("signups table found"),
        Ok(false) => warn!("signups table does not exist; run `sqlx migrate run` first"),
        Err(e) => warn!(error = %e, "could not check for the signups table"),
    }
}

/// Pings the pool every `interval` and resolves with an error after
/// `max_failures` consecutive failures. Never resolves when `max_failures`
/// is zero.
pub async fn watch_pool(pool: PgPool, interval: Duration, max_failures: u32) -> anyhow::Error {
    if max_failures == 0 {
        return std::future::pending().await;
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut failures = 0u32;
    loop {
        ticker.tick().await;
        match ping(&pool).await {
            Ok(()) => {
                if failures > 0 {
                    info!(failures, "database reachable again");
                }
                failures = 0;
            }
            Err(e) => {
                failures += 1;
                warn!(error = %e, failures, max_failures, "pool watchdog ping failed");
                if failures >= max_failures {
                    return anyhow::anyhow!(
                        "database unreachable for {failures} consecutive checks: {e}"
                    );
                }
            }
        }
    }
}

/// Nothing listens on port 1, so every connect attempt is refused.
#[cfg(test)]
pub(crate) fn unreachable_config() -> DbConfig {
    DbConfig {
        database_url: None,
        host: "127.0.0.1".into(),
        port: 1,
        name: "signups".into(),
        user: "postgres".into(),
        password: None,
        max_connections: 2,
        idle_timeout: Duration::from_secs(30),
        connect_timeout: Duration::from_millis(200),
        watchdog_interval: Duration::from_millis(10),
        watchdog_max_failures: 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ping_fails_against_unreachable_database() {
        let pool = build_pool(&unreachable_config()).unwrap();
        let err = ping(&pool).await.unwrap_err();
        assert_eq!(
            crate::error::classify(&err),
            crate::error::ErrorKind::DatastoreUnavailable
        );
    }

    #[tokio::test]
    async fn watchdog_gives_up_after_consecutive_failures() {
        let cfg = unreachable_config();
        let pool = build_pool(&cfg).unwrap();
        let err = watch_pool(pool, cfg.watchdog_interval, cfg.watchdog_max_failures).await;
        assert!(err.to_string().contains("2 consecutive checks"));
    }

    #[tokio::test]
    async fn disabled_watchdog_never_fires() {
        let cfg = unreachable_config();
        let pool = build_pool(&cfg).unwrap();
        let res = tokio::time::timeout(
            Duration::from_millis(50),
            watch_pool(pool, cfg.watchdog_interval, 0),
        )
        .await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn startup_verification_tolerates_missing_database() {
        let pool = build_pool(&unreachable_config()).unwrap();
        verify_startup(&pool).await;
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires PostgreSQL via DATABASE_URL"]
    async fn ping_succeeds_against_live_database(pool: PgPool) {
        ping(&pool).await.unwrap();
        verify_startup(&pool).await;
    }
}
