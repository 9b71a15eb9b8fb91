use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use axum::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
    error::AppError,
    signups::{
        repo::SignupStore,
        repo_types::{NewSignup, Signup},
    },
};

/// In-process stand-in for `PgSignupStore`. The mutex makes check-and-insert
/// atomic, which is what the unique index guarantees in PostgreSQL.
#[derive(Default)]
pub struct MemorySignupStore {
    rows: Mutex<Vec<Signup>>,
    down: AtomicBool,
}

impl MemorySignupStore {
    /// A store whose every call fails as if the database refused connections.
    pub fn unreachable() -> Self {
        let store = Self::default();
        store.down.store(true, Ordering::SeqCst);
        store
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check_up(&self) -> Result<(), AppError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(AppError::from(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl SignupStore for MemorySignupStore {
    async fn insert_unique(&self, new: &NewSignup) -> Result<Signup, AppError> {
        self.check_up()?;
        let mut rows = self.rows.lock().unwrap();
        let email = new.email.to_lowercase();
        if rows.iter().any(|s| s.email.to_lowercase() == email) {
            return Err(AppError::Conflict);
        }

        // Strictly increasing timestamps even when the clock does not move.
        let mut created_at = OffsetDateTime::now_utc();
        if let Some(last) = rows.iter().map(|s| s.created_at).max() {
            if created_at <= last {
                created_at = last + Duration::microseconds(1);
            }
        }

        let signup = Signup {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            email: new.email.clone(),
            role: new.role.clone(),
            created_at,
        };
        rows.push(signup.clone());
        Ok(signup)
    }

    async fn list_recent(&self) -> Result<Vec<Signup>, AppError> {
        self.check_up()?;
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check_up()
    }
}
