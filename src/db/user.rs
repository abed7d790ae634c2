use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String, // Argon2 hash, opaque here, never in JSON
    pub session_id: Option<String>,
    pub reset_token: Option<String>,
}
