//! Per-visitor persisted state.
//!
//! Everything the storefront remembers about a visitor lives behind the
//! [`SessionStore`] trait: the bearer token and cached user, the cart, and
//! one-shot flash notices. In production the store is the request's
//! `tower_sessions::Session`; tests use [`MemorySessionStore`].

mod auth_state;
mod flash;
mod memory;
mod tower_store;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use auth_state::{AuthState, AuthToken};
pub use flash::{Notice, NoticeKind, push_notice, take_notice};
pub use memory::MemorySessionStore;

/// Keys used in the session.
pub mod keys {
    /// Bearer token issued by the food API.
    pub const AUTH_TOKEN: &str = "auth_token";

    /// Cached [`User`](tiffin_buddy_core::User) for the token.
    pub const CURRENT_USER: &str = "current_user";

    /// The visitor's [`Cart`](tiffin_buddy_core::Cart).
    pub const CART: &str = "cart";

    /// Pending flash [`Notice`](super::Notice).
    pub const FLASH: &str = "flash";
}

/// Errors raised by a session backend.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// The backend failed to read or write.
    #[error("session backend error: {0}")]
    Backend(String),

    /// A stored value could not be (de)serialized.
    #[error("session value error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Key-value storage scoped to one visitor.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the raw value stored under `key`.
    async fn load_value(&self, key: &str) -> Result<Option<Value>, SessionStoreError>;

    /// Replace the value stored under `key`.
    async fn store_value(&self, key: &str, value: Value) -> Result<(), SessionStoreError>;

    /// Remove the value stored under `key`, if any.
    async fn delete_value(&self, key: &str) -> Result<(), SessionStoreError>;

    /// Issue a new session identifier, keeping the data.
    async fn rotate(&self) -> Result<(), SessionStoreError> {
        Ok(())
    }

    /// Drop every value in the session.
    async fn flush_all(&self) -> Result<(), SessionStoreError>;
}

/// Read and deserialize the value stored under `key`.
///
/// # Errors
///
/// Returns an error if the backend fails or the stored value has the wrong
/// shape.
pub async fn read<T, S>(store: &S, key: &str) -> Result<Option<T>, SessionStoreError>
where
    T: DeserializeOwned,
    S: SessionStore + ?Sized,
{
    match store.load_value(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Treat a value that no longer deserializes as absent.
pub(crate) fn readable<T>(
    result: Result<Option<T>, SessionStoreError>,
    key: &str,
) -> Result<Option<T>, SessionStoreError> {
    match result {
        Err(SessionStoreError::Serde(e)) => {
            tracing::warn!(error = %e, key, "Ignoring unreadable session value");
            Ok(None)
        }
        other => other,
    }
}

/// Serialize `value` and store it under `key`.
///
/// # Errors
///
/// Returns an error if the backend fails or `value` cannot be serialized.
pub async fn write<T, S>(store: &S, key: &str, value: &T) -> Result<(), SessionStoreError>
where
    T: Serialize + Sync,
    S: SessionStore + ?Sized,
{
    store.store_value(key, serde_json::to_value(value)?).await
}

/// Remove the persisted token and user.
///
/// Called by the API client on any 401 and by [`AuthState::logout`].
///
/// # Errors
///
/// Returns an error if the backend fails.
pub async fn clear_auth<S>(store: &S) -> Result<(), SessionStoreError>
where
    S: SessionStore + ?Sized,
{
    store.delete_value(keys::AUTH_TOKEN).await?;
    store.delete_value(keys::CURRENT_USER).await
}

/// Load the visitor's cart, or an empty one.
///
/// A cart that no longer deserializes is discarded rather than failing the
/// request.
///
/// # Errors
///
/// Returns an error if the backend fails.
pub async fn load_cart<S>(store: &S) -> Result<tiffin_buddy_core::Cart, SessionStoreError>
where
    S: SessionStore + ?Sized,
{
    match read(store, keys::CART).await {
        Ok(cart) => Ok(cart.unwrap_or_default()),
        Err(SessionStoreError::Serde(e)) => {
            tracing::warn!(error = %e, "Discarding unreadable cart");
            store.delete_value(keys::CART).await?;
            Ok(tiffin_buddy_core::Cart::default())
        }
        Err(e) => Err(e),
    }
}

/// Persist the visitor's cart.
///
/// # Errors
///
/// Returns an error if the backend fails.
pub async fn save_cart<S>(store: &S, cart: &tiffin_buddy_core::Cart) -> Result<(), SessionStoreError>
where
    S: SessionStore + ?Sized,
{
    write(store, keys::CART, cart).await
}
