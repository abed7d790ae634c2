use serde::{Deserialize, Serialize};

/// Form body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Form body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Form body for requesting a password-reset token.
#[derive(Debug, Deserialize)]
pub struct ResetTokenRequest {
    pub email: String,
}

/// Form body for committing a password reset.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub email: String,
    pub reset_token: String,
    pub new_password: String,
}

/// Bare status payload, e.g. `{"message": "email already registered"}`.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Payload naming the affected user, e.g. register and login responses.
#[derive(Debug, Serialize)]
pub struct EmailMessage {
    pub email: String,
    pub message: String,
}

/// Profile lookup response.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub email: String,
}

/// Password-reset token response.
#[derive(Debug, Serialize)]
pub struct ResetToken {
    pub email: String,
    pub reset_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_response_shape() {
        let body = EmailMessage {
            email: "alice@example.com".into(),
            message: "user created".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"email": "alice@example.com", "message": "user created"})
        );
    }

    #[test]
    fn reset_token_response_shape() {
        let body = ResetToken {
            email: "alice@example.com".into(),
            reset_token: "tok".into(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("reset_token"));
        assert!(json.contains("tok"));
    }

    #[test]
    fn update_password_request_field_names() {
        // Field names are the wire contract for the PUT /reset_password form.
        let req: UpdatePasswordRequest = serde_json::from_value(serde_json::json!({
            "email": "a@b.c",
            "reset_token": "t",
            "new_password": "np",
        }))
        .unwrap();
        assert_eq!(req.email, "a@b.c");
        assert_eq!(req.reset_token, "t");
        assert_eq!(req.new_password, "np");
    }
}
