//! Authentication extractors.
//!
//! These gate what the storefront shows. The food API makes the real
//! authorization decision on every call.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tiffin_buddy_core::User;
use tower_sessions::Session;

use crate::session::AuthState;

/// Error returned when a page needs a user the visitor doesn't have.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not logged in.
    RedirectToLogin,
    /// Logged in, but not an admin.
    RedirectHome,
    /// The session layer is missing or failed.
    SessionUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::SessionUnavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

async fn load_auth(parts: &Parts) -> Result<AuthState, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::SessionUnavailable)?;

    AuthState::load(session).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load auth state");
        AuthRejection::SessionUnavailable
    })
}

/// Extractor that requires a logged-in user.
///
/// Redirects to the login page otherwise.
pub struct RequireAuth(pub User);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        load_auth(parts)
            .await?
            .user()
            .cloned()
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that requires a logged-in admin.
///
/// Anonymous visitors go to the login page, customers to the menu.
pub struct RequireAdmin(pub User);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = load_auth(parts).await?;
        match auth.user() {
            Some(user) if user.is_admin() => Ok(Self(user.clone())),
            Some(_) => Err(AuthRejection::RedirectHome),
            None => Err(AuthRejection::RedirectToLogin),
        }
    }
}
