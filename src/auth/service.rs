use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::db::{Db, DbError, User, UserFilter, UserUpdate};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("no user registered with email {0}")]
    UnknownEmail(String),

    #[error("invalid reset token")]
    InvalidResetToken,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Opaque token for sessions and password resets.
fn generate_token() -> String {
    Uuid::new_v4().to_string()
}

/// Authentication service. Everything credential-shaped lives here; the
/// [`Db`] layer below never sees a plaintext password.
#[derive(Clone)]
pub struct Auth {
    db: Db,
}

impl Auth {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Register a new user, hashing the password before it is stored.
    /// Find-before-create: an existing user with the same email is
    /// `EmailTaken`.
    pub async fn register_user(&self, email: &str, password: &str) -> Result<User, AuthError> {
        match self.db.find_user_by(&UserFilter::new().email(email)).await {
            Ok(_) => return Err(AuthError::EmailTaken(email.to_string())),
            Err(DbError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let hash = hash_password(password).map_err(|e| AuthError::Hash(e.to_string()))?;
        let user = self.db.add_user(email, &hash).await?;
        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Check a login attempt. Unknown email and wrong password both come
    /// back as `Ok(false)`; only store or hash-parsing failures are errors.
    pub async fn valid_login(&self, email: &str, password: &str) -> Result<bool, AuthError> {
        let user = match self.db.find_user_by(&UserFilter::new().email(email)).await {
            Ok(user) => user,
            Err(DbError::NotFound) => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        verify_password(password, &user.hashed_password)
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    /// Start a session for the given email and return the opaque token.
    pub async fn create_session(&self, email: &str) -> Result<String, AuthError> {
        let user = match self.db.find_user_by(&UserFilter::new().email(email)).await {
            Ok(user) => user,
            Err(DbError::NotFound) => return Err(AuthError::UnknownEmail(email.to_string())),
            Err(e) => return Err(e.into()),
        };

        let token = generate_token();
        self.db
            .update_user(user.id, &UserUpdate::new().session_id(Some(token.as_str())))
            .await?;
        debug!(user_id = user.id, "session created");
        Ok(token)
    }

    /// Resolve a session token to its user, if any.
    pub async fn user_from_session(&self, session_id: &str) -> Result<Option<User>, AuthError> {
        match self
            .db
            .find_user_by(&UserFilter::new().session_id(Some(session_id)))
            .await
        {
            Ok(user) => Ok(Some(user)),
            Err(DbError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// End the user's session by clearing the stored token.
    pub async fn destroy_session(&self, user_id: i64) -> Result<(), AuthError> {
        self.db
            .update_user(user_id, &UserUpdate::new().session_id(None))
            .await?;
        debug!(user_id, "session destroyed");
        Ok(())
    }

    /// Issue a one-time password-reset token for the given email.
    pub async fn reset_password_token(&self, email: &str) -> Result<String, AuthError> {
        let user = match self.db.find_user_by(&UserFilter::new().email(email)).await {
            Ok(user) => user,
            Err(DbError::NotFound) => return Err(AuthError::UnknownEmail(email.to_string())),
            Err(e) => return Err(e.into()),
        };

        let token = generate_token();
        self.db
            .update_user(user.id, &UserUpdate::new().reset_token(Some(token.as_str())))
            .await?;
        info!(user_id = user.id, "password reset token issued");
        Ok(token)
    }

    /// Replace the password of the user holding `reset_token`, clearing the
    /// token in the same update so it cannot be replayed.
    pub async fn update_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = match self
            .db
            .find_user_by(&UserFilter::new().reset_token(Some(reset_token)))
            .await
        {
            Ok(user) => user,
            Err(DbError::NotFound) => return Err(AuthError::InvalidResetToken),
            Err(e) => return Err(e.into()),
        };

        let hash = hash_password(new_password).map_err(|e| AuthError::Hash(e.to_string()))?;
        self.db
            .update_user(
                user.id,
                &UserUpdate::new().hashed_password(&hash).reset_token(None),
            )
            .await?;
        info!(user_id = user.id, "password updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_uuids() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
        assert!(Uuid::parse_str(&b).is_ok());
    }

    #[test]
    fn auth_error_display() {
        let err = AuthError::EmailTaken("alice@example.com".into());
        assert!(err.to_string().contains("alice@example.com"));
        assert_eq!(AuthError::InvalidResetToken.to_string(), "invalid reset token");
    }

    #[test]
    fn db_errors_pass_through_transparently() {
        let err: AuthError = DbError::NotFound.into();
        assert_eq!(err.to_string(), DbError::NotFound.to_string());
    }
}
