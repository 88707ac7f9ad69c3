use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Authenticated,
    #[default]
    Unauthenticated,
    Verifying,
}

/// Snapshot of the session. Only the controller writes it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub status: SessionStatus,
    pub user: Option<User>,
    #[serde(skip)]
    pub token: Option<String>,
}

impl Session {
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn verifying() -> Self {
        Self {
            status: SessionStatus::Verifying,
            ..Self::default()
        }
    }

    pub fn authenticated(user: User, token: String) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            user: Some(user),
            token: Some(token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}

/// Login request body.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub phone: String,
    pub password: String,
}

impl Credentials {
    pub fn new(phone: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("phone", &self.phone)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Envelope returned by the login and "who am I" endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub user: Option<User>,
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let rendered = format!("{:?}", Credentials::new("+15550100", "hunter2"));
        assert!(rendered.contains("+15550100"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn session_serialization_omits_token() {
        let session = Session::authenticated(User::new("+1", "Ana", "tenant"), "secret".into());
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"status\":\"authenticated\""));
        assert!(!json.contains("secret"));
    }

    #[test]
    fn auth_response_tolerates_missing_fields() {
        let parsed: AuthResponse =
            serde_json::from_str(r#"{"success":false,"message":"Wrong password"}"#).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.message.as_deref(), Some("Wrong password"));
        assert!(parsed.user.is_none());
        assert!(parsed.token.is_none());
    }
}
