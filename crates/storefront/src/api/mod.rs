//! Client for the TiffinBuddy food API.
//!
//! Every request made on behalf of a visitor reads the bearer token from
//! their session. A 401 on such a request clears the persisted auth record
//! and surfaces as [`ApiError::Unauthorized`], which the application error
//! type turns into a redirect to the login page.

mod client;
mod types;

use reqwest::StatusCode;
use thiserror::Error;

pub use client::{FoodApiClient, IDEMPOTENCY_KEY_HEADER};
pub use types::{AuthResponse, ErrorBody};

use crate::session::SessionStoreError;

/// Error code the API uses for a delivery point outside the service radius.
pub const OUT_OF_RANGE_CODE: &str = "DELIVERY_OUT_OF_RANGE";

/// Substring of the older out-of-range message, used only when no code is
/// present.
const LEGACY_OUT_OF_RANGE_MARKER: &str = "10km";

/// Errors from the food API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Login was rejected.
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// The session token was rejected; the session has been cleared.
    #[error("session expired")]
    Unauthorized,

    /// The caller lacks the role for this operation.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// The request was rejected as invalid.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// The delivery point is outside the service radius.
    #[error("delivery location out of range: {message}")]
    OutOfRange { message: String },

    /// The API failed.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A success response had an unexpected body.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The configured base URL cannot carry a path.
    #[error("API base URL cannot be used for requests")]
    InvalidBaseUrl,

    /// Reading or clearing the session failed.
    #[error("session error: {0}")]
    Session(#[from] SessionStoreError),
}

impl ApiError {
    /// Message suitable for showing to the visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the server. Please check your connection and try again."
                    .to_string()
            }
            Self::InvalidCredentials { message }
            | Self::Forbidden { message }
            | Self::Validation { message }
            | Self::OutOfRange { message } => message.clone(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::Server { .. } | Self::Decode(_) | Self::InvalidBaseUrl | Self::Session(_) => {
                "Something went wrong on our side. Please try again later.".to_string()
            }
        }
    }

    /// Whether this is a failure of the API or the storefront rather than
    /// of the visitor's request.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        matches!(
            self,
            Self::Server { .. } | Self::Decode(_) | Self::InvalidBaseUrl | Self::Session(_)
        )
    }
}

/// Map a non-success response to an [`ApiError`].
#[must_use]
pub fn classify(status: StatusCode, body: &str) -> ApiError {
    let parsed = ErrorBody::parse(body);
    let message = parsed.message.clone().unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden { message },
        s if s.is_client_error() => {
            if is_out_of_range(parsed.code.as_deref(), &message) {
                ApiError::OutOfRange { message }
            } else {
                ApiError::Validation { message }
            }
        }
        s => ApiError::Server {
            status: s.as_u16(),
            message,
        },
    }
}

fn is_out_of_range(code: Option<&str>, message: &str) -> bool {
    match code {
        Some(code) => code == OUT_OF_RANGE_CODE,
        None => message.contains(LEGACY_OUT_OF_RANGE_MARKER),
    }
}
