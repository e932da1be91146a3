use serde::{Deserialize, Serialize};

use crate::types::User;

/// Request body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// The account email address.
    pub email: String,
    /// The account password.
    pub password: String,
}

impl LoginRequest {
    /// Creates a new login request.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Request body for `POST /auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignupRequest {
    /// The account email address.
    pub email: String,

    /// Display name for the new account.
    pub username: String,

    /// The account password.
    pub password: String,

    /// Optional model provider preference, passed through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_provider: Option<String>,

    /// Optional model preference, passed through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

impl SignupRequest {
    /// Creates a new signup request with no model preferences.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
            model_provider: None,
            model_name: None,
        }
    }

    /// Sets the model provider preference.
    pub fn with_model_provider(mut self, provider: impl Into<String>) -> Self {
        self.model_provider = Some(provider.into());
        self
    }

    /// Sets the model preference.
    pub fn with_model_name(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }
}

/// Response body from both authentication endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// The bearer token to attach to subsequent requests.
    pub access_token: String,

    /// Token type; the service always issues bearer tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Token lifetime in seconds, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    /// The authenticated user.
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_request_serializes() {
        let req = LoginRequest::new("a@b.com", "pw");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"email": "a@b.com", "password": "pw"})
        );
    }

    #[test]
    fn signup_request_skips_absent_preferences() {
        let req = SignupRequest::new("a@b.com", "ab", "pw");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"email": "a@b.com", "username": "ab", "password": "pw"})
        );
    }

    #[test]
    fn signup_request_passes_preferences_through() {
        let req = SignupRequest::new("a@b.com", "ab", "pw")
            .with_model_provider("openai")
            .with_model_name("gpt-4o");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model_provider"], "openai");
        assert_eq!(json["model_name"], "gpt-4o");
    }

    #[test]
    fn token_response_deserializes() {
        let resp: TokenResponse = serde_json::from_value(json!({
            "access_token": "tok1",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": {"id": "u1", "email": "a@b.com"}
        }))
        .unwrap();
        assert_eq!(resp.access_token, "tok1");
        assert_eq!(resp.user.id, "u1");
    }
}
