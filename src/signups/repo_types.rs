use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Signup row as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Signup {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated, trimmed input ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSignup {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
}
