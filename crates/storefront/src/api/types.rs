//! Request and response bodies of the food API.

use serde::{Deserialize, Serialize};
use tiffin_buddy_core::{Role, User};

use crate::session::AuthToken;

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

/// Response of both auth endpoints, as sent on the wire.
#[derive(Deserialize)]
pub(crate) struct AuthResponseBody {
    pub token: String,
    pub user: User,
}

/// A successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub token: AuthToken,
    pub user: User,
}

impl From<AuthResponseBody> for AuthResponse {
    fn from(body: AuthResponseBody) -> Self {
        Self {
            token: AuthToken::new(body.token),
            user: body.user,
        }
    }
}

/// Error body: `{ "message": string, "code"?: string }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorBody {
    /// Parse an error body, tolerating non-JSON and empty messages.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let mut parsed: Self = serde_json::from_str(body).unwrap_or_default();
        parsed.message = parsed.message.filter(|m| !m.trim().is_empty());
        parsed
    }
}
