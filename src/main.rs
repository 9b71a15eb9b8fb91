use std::net::SocketAddr;

mod app;
mod config;
mod db;
mod error;
mod routes;
mod signups;
mod state;

use tracing_subscriber::EnvFilter;

use crate::{config::AppConfig, state::AppState};

const DEFAULT_LOG_FILTER: &str = "signups=debug,axum=info,tower_http=info";

/// `RUST_LOG` picks the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json_logs_requested(std::env::var("LOG_FORMAT").ok().as_deref()) {
        builder.with_target(false).json().init();
    } else {
        builder.init();
    }
}

fn json_logs_requested(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.trim().eq_ignore_ascii_case("json"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let (watchdog_interval, watchdog_max_failures) =
        (config.db.watchdog_interval, config.db.watchdog_max_failures);

    let app_state = AppState::init(config)?;
    db::verify_startup(&app_state.db).await;

    let pool = app_state.db.clone();
    let app = app::build_app(app_state);

    let outcome = tokio::select! {
        res = app::serve(app, addr, app::shutdown_signal()) => res,
        err = db::watch_pool(pool.clone(), watchdog_interval, watchdog_max_failures) => {
            tracing::error!(error = %err, "database pool failed; exiting so the supervisor can restart us");
            Err(err)
        }
    };

    pool.close().await;
    tracing::info!("database pool closed");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_switch() {
        assert!(json_logs_requested(Some("json")));
        assert!(json_logs_requested(Some(" JSON ")));
        assert!(!json_logs_requested(Some("pretty")));
        assert!(!json_logs_requested(None));
    }

    #[test]
    fn default_filter_parses() {
        assert!(DEFAULT_LOG_FILTER.parse::<EnvFilter>().is_ok());
    }
}
