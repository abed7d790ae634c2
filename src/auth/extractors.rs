use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};

use crate::auth::dto::Message;

pub const SESSION_COOKIE: &str = "session_id";

/// Extracts the opaque session token from the `session_id` cookie.
///
/// Only proves the request carries a token; handlers still resolve it
/// against the store and decide whether the session is live.
pub struct SessionToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<Message>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(forbidden)?;

        let token = session_cookie(cookies).ok_or_else(forbidden)?;
        Ok(SessionToken(token.to_string()))
    }
}

fn forbidden() -> (StatusCode, Json<Message>) {
    (StatusCode::FORBIDDEN, Json(Message::new("forbidden")))
}

fn session_cookie(header: &str) -> Option<&str> {
    header.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_session_cookie_alone() {
        assert_eq!(session_cookie("session_id=abc"), Some("abc"));
    }

    #[test]
    fn finds_session_cookie_among_others() {
        let header = "theme=dark; session_id=abc-123; lang=fr";
        assert_eq!(session_cookie(header), Some("abc-123"));
    }

    #[test]
    fn ignores_cookies_with_similar_names() {
        assert_eq!(session_cookie("old_session_id=zzz"), None);
        assert_eq!(session_cookie("session_id_old=zzz"), None);
    }

    #[test]
    fn rejects_missing_or_empty_token() {
        assert_eq!(session_cookie("theme=dark"), None);
        assert_eq!(session_cookie("session_id="), None);
        assert_eq!(session_cookie(""), None);
    }
}
