use axum::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::{
    db,
    error::AppError,
    signups::repo_types::{NewSignup, Signup},
};

/// Persistence seam for signups. Storage errors come back already classified.
#[async_trait]
pub trait SignupStore: Send + Sync {
    /// Inserts `new` unless its email is taken (case-insensitive), in which
    /// case `AppError::Conflict` is returned.
    async fn insert_unique(&self, new: &NewSignup) -> Result<Signup, AppError>;
    /// All signups, most recent first.
    async fn list_recent(&self) -> Result<Vec<Signup>, AppError>;
    async fn ping(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgSignupStore {
    pool: PgPool,
}

impl PgSignupStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SignupStore for PgSignupStore {
    async fn insert_unique(&self, new: &NewSignup) -> Result<Signup, AppError> {
        // Check and insert share one connection; it goes back to the pool
        // when `conn` drops, on every path out of this function.
        let mut conn = self.pool.acquire().await?;

        // Fast path only. Two requests can both pass this check; the unique
        // index on LOWER(email) rejects the loser with 23505, which maps to
        // the same Conflict.
        let existing = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM signups WHERE LOWER(email) = LOWER($1)"#,
        )
        .bind(&new.email)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(id) = existing {
            debug!(existing_id = %id, "email already registered");
            return Err(AppError::Conflict);
        }

        let signup = sqlx::query_as::<_, Signup>(
            r#"
            INSERT INTO signups (name, email, role, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, name, email, role, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(new.role.as_deref())
        .fetch_one(&mut *conn)
        .await?;
        Ok(signup)
    }

    async fn list_recent(&self) -> Result<Vec<Signup>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, Signup>(
            r#"
            SELECT id, name, email, role, created_at
            FROM signups
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), AppError> {
        db::ping(&self.pool).await?;
        Ok(())
    }
}
