//! The visitor's authentication state.

use secrecy::{ExposeSecret, SecretString};
use tiffin_buddy_core::User;

use super::{SessionStore, SessionStoreError, clear_auth, keys, read, readable, write};

/// Bearer token issued by the food API.
///
/// `Debug` never prints the token.
#[derive(Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Token and user, always together.
#[derive(Debug, Clone)]
struct Authenticated {
    token: AuthToken,
    user: User,
}

/// Who the visitor is, if anyone.
///
/// Loaded from the session at the start of each request. Only [`login`],
/// [`logout`] and the API client's 401 handling change what is persisted.
///
/// [`login`]: Self::login
/// [`logout`]: Self::logout
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    current: Option<Authenticated>,
}

impl AuthState {
    /// Load the persisted state.
    ///
    /// A token without a user (or the reverse) is cleared and treated as
    /// logged out. An unreadable value counts as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend fails; nothing is cleared
    /// in that case.
    pub async fn load<S>(store: &S) -> Result<Self, SessionStoreError>
    where
        S: SessionStore + ?Sized,
    {
        let token: Option<String> =
            readable(read(store, keys::AUTH_TOKEN).await, keys::AUTH_TOKEN)?;
        let user: Option<User> =
            readable(read(store, keys::CURRENT_USER).await, keys::CURRENT_USER)?;

        match (token, user) {
            (Some(token), Some(user)) => Ok(Self {
                current: Some(Authenticated {
                    token: AuthToken::new(token),
                    user,
                }),
            }),
            (None, None) => Ok(Self::default()),
            _ => {
                tracing::warn!("Clearing half-present auth record");
                clear_auth(store).await?;
                Ok(Self::default())
            }
        }
    }

    /// The logged-in user.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|auth| &auth.user)
    }

    /// The bearer token.
    #[must_use]
    pub fn token(&self) -> Option<&AuthToken> {
        self.current.as_ref().map(|auth| &auth.token)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(User::is_admin)
    }

    /// Record a successful login or registration.
    ///
    /// Rotates the session id before persisting the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend fails.
    pub async fn login<S>(
        &mut self,
        store: &S,
        token: AuthToken,
        user: User,
    ) -> Result<(), SessionStoreError>
    where
        S: SessionStore + ?Sized,
    {
        store.rotate().await?;
        write(store, keys::AUTH_TOKEN, &token.expose()).await?;
        write(store, keys::CURRENT_USER, &user).await?;

        self.current = Some(Authenticated { token, user });
        Ok(())
    }

    /// Forget the visitor and everything in their session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend fails.
    pub async fn logout<S>(&mut self, store: &S) -> Result<(), SessionStoreError>
    where
        S: SessionStore + ?Sized,
    {
        self.current = None;
        clear_auth(store).await?;
        store.flush_all().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;
    use tiffin_buddy_core::{Role, UserId};

    use super::*;
    use crate::session::MemorySessionStore;

    /// Reads of `failing_key` fail; everything else goes to `inner`.
    struct FlakyStore {
        inner: MemorySessionStore,
        failing_key: &'static str,
    }

    #[async_trait]
    impl SessionStore for FlakyStore {
        async fn load_value(&self, key: &str) -> Result<Option<Value>, SessionStoreError> {
            if key == self.failing_key {
                return Err(SessionStoreError::Backend("read timed out".to_string()));
            }
            self.inner.load_value(key).await
        }

        async fn store_value(&self, key: &str, value: Value) -> Result<(), SessionStoreError> {
            self.inner.store_value(key, value).await
        }

        async fn delete_value(&self, key: &str) -> Result<(), SessionStoreError> {
            self.inner.delete_value(key).await
        }

        async fn flush_all(&self) -> Result<(), SessionStoreError> {
            self.inner.flush_all().await
        }
    }

    fn asha() -> User {
        User {
            id: UserId::new("u1"),
            email: "asha@example.in".to_string(),
            name: "Asha".to_string(),
            role: Role::Customer,
        }
    }

    #[tokio::test]
    async fn test_fresh_session_is_unauthenticated() {
        let store = MemorySessionStore::new();
        let auth = AuthState::load(&store).await.unwrap();
        assert!(!auth.is_authenticated());
        assert!(auth.user().is_none());
    }

    #[tokio::test]
    async fn test_login_persists_token_and_user() {
        let store = MemorySessionStore::new();
        let mut auth = AuthState::load(&store).await.unwrap();
        auth.login(&store, AuthToken::new("tok-1"), asha()).await.unwrap();

        assert_eq!(auth.user().map(|u| u.name.as_str()), Some("Asha"));

        let reloaded = AuthState::load(&store).await.unwrap();
        assert_eq!(reloaded.token().map(AuthToken::expose), Some("tok-1"));
        assert_eq!(reloaded.user(), Some(&asha()));
    }

    #[tokio::test]
    async fn test_logout_clears_store() {
        let store = MemorySessionStore::new();
        let mut auth = AuthState::default();
        auth.login(&store, AuthToken::new("tok-1"), asha()).await.unwrap();
        auth.logout(&store).await.unwrap();

        assert!(!auth.is_authenticated());
        assert!(!store.contains(keys::AUTH_TOKEN));
        assert!(!AuthState::load(&store).await.unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_token_without_user_is_cleared() {
        let store = MemorySessionStore::new();
        write(&store, keys::AUTH_TOKEN, &"orphan").await.unwrap();

        let auth = AuthState::load(&store).await.unwrap();
        assert!(!auth.is_authenticated());
        assert!(!store.contains(keys::AUTH_TOKEN));
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_login() {
        let store = FlakyStore {
            inner: MemorySessionStore::new(),
            failing_key: keys::CURRENT_USER,
        };
        AuthState::default()
            .login(&store, AuthToken::new("tok-1"), asha())
            .await
            .unwrap();

        let err = AuthState::load(&store).await.unwrap_err();
        assert!(matches!(err, SessionStoreError::Backend(_)));
        assert!(store.inner.contains(keys::AUTH_TOKEN));
        assert!(store.inner.contains(keys::CURRENT_USER));
    }

    #[tokio::test]
    async fn test_unreadable_user_is_cleared() {
        let store = MemorySessionStore::new();
        write(&store, keys::AUTH_TOKEN, &"tok-1").await.unwrap();
        write(&store, keys::CURRENT_USER, &42).await.unwrap();

        let auth = AuthState::load(&store).await.unwrap();
        assert!(!auth.is_authenticated());
        assert!(!store.contains(keys::AUTH_TOKEN));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = AuthToken::new("super-secret-jwt");
        assert!(!format!("{token:?}").contains("super-secret-jwt"));
    }
}
