use crate::config::AppConfig;
use crate::db;
use crate::signups::{PgSignupStore, SignupStore};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub signups: Arc<dyn SignupStore>,
}

impl AppState {
    pub fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = db::build_pool(&config.db)?;
        let signups = Arc::new(PgSignupStore::new(db.clone())) as Arc<dyn SignupStore>;
        Ok(Self::from_parts(db, Arc::new(config), signups))
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>, signups: Arc<dyn SignupStore>) -> Self {
        Self {
            db,
            config,
            signups,
        }
    }

    /// State backed by `signups`; the pool points nowhere and is never used.
    #[cfg(test)]
    pub fn for_tests(signups: Arc<dyn SignupStore>, expose_error_details: bool) -> Self {
        let mut config = AppConfig::from_lookup(|_| None).expect("default config");
        config.db = db::unreachable_config();
        config.expose_error_details = expose_error_details;
        let db = db::build_pool(&config.db).expect("lazy pool ok");
        Self::from_parts(db, Arc::new(config), signups)
    }
}
