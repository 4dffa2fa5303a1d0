//! Authentication route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::Redirect,
};
use secrecy::SecretString;
use serde::Deserialize;
use tiffin_buddy_core::{Role, User};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use super::PageContext;
use crate::api::AuthResponse;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::session::{AuthState, Notice, push_notice};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub tab: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login and registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<&'static str>,
    pub show_register: bool,
}

/// Message for an `?error=` code.
fn error_message(code: &str) -> Option<&'static str> {
    match code {
        "session_expired" => Some("Your session has expired. Please log in again."),
        _ => None,
    }
}

/// Where a user lands after logging in.
fn landing_page(user: &User) -> &'static str {
    if user.is_admin() { "/admin" } else { "/" }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(session))]
pub async fn login_page(
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Result<LoginTemplate, AppError> {
    Ok(LoginTemplate {
        page: PageContext::load(&session).await?,
        error: query.error.as_deref().and_then(error_message),
        show_register: query.tab.as_deref() == Some("register"),
    })
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AppError> {
    let password = SecretString::from(form.password);

    match state.api().login(form.email.trim(), &password).await {
        Ok(response) => {
            let user = establish(&session, response).await?;
            push_notice(
                &session,
                &Notice::success("Welcome back!", format!("Logged in as {}.", user.name)),
            )
            .await?;
            Ok(Redirect::to(landing_page(&user)))
        }
        Err(e) => {
            warn!(error = %e, "Login failed");
            push_notice(&session, &Notice::error("Login failed", e.user_message())).await?;
            Ok(Redirect::to("/auth/login"))
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Handle registration form submission.
///
/// A successful registration logs the new account in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, AppError> {
    let name = form.name.trim();
    let email = form.email.trim();
    if name.is_empty() || email.is_empty() || form.password.is_empty() {
        push_notice(
            &session,
            &Notice::error("Registration failed", "Name, email and password are required."),
        )
        .await?;
        return Ok(Redirect::to("/auth/login?tab=register"));
    }

    let role = form
        .role
        .as_deref()
        .and_then(|role| role.parse::<Role>().ok())
        .unwrap_or_default();
    let password = SecretString::from(form.password);

    match state.api().register(name, email, &password, role).await {
        Ok(response) => {
            let user = establish(&session, response).await?;
            push_notice(
                &session,
                &Notice::success("Account created!", format!("Welcome to TiffinBuddy, {}.", user.name)),
            )
            .await?;
            Ok(Redirect::to(landing_page(&user)))
        }
        Err(e) => {
            warn!(error = %e, "Registration failed");
            push_notice(&session, &Notice::error("Registration failed", e.user_message()))
                .await?;
            Ok(Redirect::to("/auth/login?tab=register"))
        }
    }
}

/// Persist a fresh login and tag Sentry with the user.
async fn establish(session: &Session, response: AuthResponse) -> Result<User, AppError> {
    let AuthResponse { token, user } = response;
    let mut auth = AuthState::default();
    auth.login(session, token, user.clone()).await?;

    set_sentry_user(&user.id, Some(&user.email));
    info!(user_id = %user.id, role = %user.role, "User logged in");
    Ok(user)
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
///
/// Clears the whole session, cart included.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    let mut auth = AuthState::load(&session).await?;
    auth.logout(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
