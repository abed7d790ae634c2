use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderName, StatusCode},
    response::{AppendHeaders, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            EmailMessage, LoginRequest, Message, Profile, RegisterRequest, ResetToken,
            ResetTokenRequest, UpdatePasswordRequest,
        },
        extractors::{SessionToken, SESSION_COOKIE},
        service::AuthError,
    },
    state::AppState,
};

type ApiError = (StatusCode, Json<Message>);

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/sessions", post(login).delete(logout))
        .route("/profile", get(profile))
        .route("/reset_password", post(reset_password).put(update_password))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(Message::new(message)))
}

fn forbidden() -> ApiError {
    (StatusCode::FORBIDDEN, Json(Message::new("forbidden")))
}

fn internal(e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Message::new(&e.to_string())),
    )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Form(mut payload): Form<RegisterRequest>,
) -> Result<Json<EmailMessage>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(bad_request("invalid email"));
    }

    match state
        .auth
        .register_user(&payload.email, &payload.password)
        .await
    {
        Ok(user) => Ok(Json(EmailMessage {
            email: user.email,
            message: "user created".into(),
        })),
        Err(AuthError::EmailTaken(_)) => {
            warn!(email = %payload.email, "email already registered");
            Err(bad_request("email already registered"))
        }
        Err(e) => {
            error!(error = %e, "register failed");
            Err(internal(e))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Form(mut payload): Form<LoginRequest>,
) -> Result<(AppendHeaders<[(HeaderName, String); 1]>, Json<EmailMessage>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(bad_request("invalid email"));
    }

    let ok = state
        .auth
        .valid_login(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            error!(error = %e, "valid_login failed");
            internal(e)
        })?;

    if !ok {
        warn!(email = %payload.email, "login invalid credentials");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(Message::new("invalid credentials")),
        ));
    }

    let token = state.auth.create_session(&payload.email).await.map_err(|e| {
        error!(error = %e, "create_session failed");
        internal(e)
    })?;

    info!(email = %payload.email, "user logged in");
    Ok((
        AppendHeaders([(
            SET_COOKIE,
            format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly"),
        )]),
        Json(EmailMessage {
            email: payload.email,
            message: "logged in".into(),
        }),
    ))
}

#[instrument(skip(state, token))]
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Redirect, ApiError> {
    let user = state.auth.user_from_session(&token).await.map_err(|e| {
        error!(error = %e, "session lookup failed");
        internal(e)
    })?;

    let user = match user {
        Some(user) => user,
        None => {
            warn!("logout with stale session token");
            return Err(forbidden());
        }
    };

    state.auth.destroy_session(user.id).await.map_err(|e| {
        error!(error = %e, user_id = user.id, "destroy_session failed");
        internal(e)
    })?;

    info!(user_id = user.id, "user logged out");
    Ok(Redirect::to("/"))
}

#[instrument(skip(state, token))]
pub async fn profile(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Json<Profile>, ApiError> {
    let user = state.auth.user_from_session(&token).await.map_err(|e| {
        error!(error = %e, "session lookup failed");
        internal(e)
    })?;

    match user {
        Some(user) => Ok(Json(Profile { email: user.email })),
        None => {
            warn!("profile with stale session token");
            Err(forbidden())
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Form(mut payload): Form<ResetTokenRequest>,
) -> Result<Json<ResetToken>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    match state.auth.reset_password_token(&payload.email).await {
        Ok(token) => {
            info!(email = %payload.email, "reset token issued");
            Ok(Json(ResetToken {
                email: payload.email,
                reset_token: token,
            }))
        }
        Err(AuthError::UnknownEmail(_)) => {
            warn!(email = %payload.email, "reset token for unknown email");
            Err(forbidden())
        }
        Err(e) => {
            error!(error = %e, "reset_password_token failed");
            Err(internal(e))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    Form(mut payload): Form<UpdatePasswordRequest>,
) -> Result<Json<EmailMessage>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    match state
        .auth
        .update_password(&payload.reset_token, &payload.new_password)
        .await
    {
        Ok(()) => {
            info!(email = %payload.email, "password updated");
            Ok(Json(EmailMessage {
                email: payload.email,
                message: "Password updated".into(),
            }))
        }
        Err(AuthError::InvalidResetToken) => {
            warn!(email = %payload.email, "invalid reset token");
            Err(forbidden())
        }
        Err(e) => {
            error!(error = %e, "update_password failed");
            Err(internal(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("guillaume@holberton.io"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("with space@example.com"));
    }

    #[test]
    fn error_helpers_carry_status() {
        assert_eq!(bad_request("nope").0, StatusCode::BAD_REQUEST);
        assert_eq!(forbidden().0, StatusCode::FORBIDDEN);
        assert_eq!(internal("boom").0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
