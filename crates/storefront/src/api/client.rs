//! HTTP client for the food API.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tiffin_buddy_core::{FoodId, FoodItem, FoodItemPatch, NewFoodItem, NewOrder, Order, Role};
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use super::types::{AuthResponseBody, LoginRequest, RegisterRequest};
use super::{ApiError, AuthResponse, ErrorBody, classify};
use crate::session::{self, SessionStore, keys};

/// Header carrying the checkout attempt key on `POST /orders`.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

const USER_AGENT: &str = concat!("tiffin-buddy-storefront/", env!("CARGO_PKG_VERSION"));

/// Food API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct FoodApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
}

impl FoodApiClient {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: Url) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            inner: Arc::new(ClientInner { http, base_url }),
        })
    }

    /// The API root.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCredentials` if the API rejects them.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let request = self.inner.http.post(self.endpoint(&["auth", "login"])?).json(&body);

        let response = request.send().await.map_err(ApiError::Network)?;
        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST) {
            let text = response.text().await.unwrap_or_default();
            let message = ErrorBody::parse(&text)
                .message
                .unwrap_or_else(|| "Invalid credentials".to_string());
            debug!(%status, "Login rejected");
            return Err(ApiError::InvalidCredentials { message });
        }

        let body: AuthResponseBody = decode(check(response).await?).await?;
        Ok(body.into())
    }

    /// Create an account and log it in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with the server's message if the
    /// account cannot be created (e.g. the email is taken).
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
        role: Role,
    ) -> Result<AuthResponse, ApiError> {
        let body = RegisterRequest {
            name,
            email,
            password: password.expose_secret(),
            role,
        };
        let request = self
            .inner
            .http
            .post(self.endpoint(&["auth", "register"])?)
            .json(&body);

        let response = request.send().await.map_err(ApiError::Network)?;
        let body: AuthResponseBody = decode(check(response).await?).await?;
        Ok(body.into())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Every food item, including unavailable ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session))]
    pub async fn list_foods<S>(&self, session: &S) -> Result<Vec<FoodItem>, ApiError>
    where
        S: SessionStore + ?Sized,
    {
        let request = self.inner.http.get(self.endpoint(&["food"])?);
        let foods: Vec<FoodItem> = decode(self.send(session, request).await?).await?;
        debug!(count = foods.len(), "Fetched catalog");
        Ok(foods)
    }

    /// Add a food item (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admins, `ApiError::Validation`
    /// for a rejected item.
    #[instrument(skip(self, session, item), fields(name = %item.name))]
    pub async fn create_food<S>(&self, session: &S, item: &NewFoodItem) -> Result<FoodItem, ApiError>
    where
        S: SessionStore + ?Sized,
    {
        let request = self.inner.http.post(self.endpoint(&["food"])?).json(item);
        decode(self.send(session, request).await?).await
    }

    /// Change fields of a food item (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admins, `ApiError::Validation`
    /// for a rejected change.
    #[instrument(skip(self, session, patch))]
    pub async fn update_food<S>(
        &self,
        session: &S,
        id: &FoodId,
        patch: &FoodItemPatch,
    ) -> Result<FoodItem, ApiError>
    where
        S: SessionStore + ?Sized,
    {
        let request = self
            .inner
            .http
            .put(self.endpoint(&["food", id.as_str()])?)
            .json(patch);
        decode(self.send(session, request).await?).await
    }

    /// Remove a food item (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admins.
    #[instrument(skip(self, session))]
    pub async fn delete_food<S>(&self, session: &S, id: &FoodId) -> Result<(), ApiError>
    where
        S: SessionStore + ?Sized,
    {
        let request = self.inner.http.delete(self.endpoint(&["food", id.as_str()])?);
        self.send(session, request).await?;
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order.
    ///
    /// `attempt_key` is sent as the `Idempotency-Key` header so an API that
    /// honours it can drop a retried submission.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::OutOfRange` when the delivery point is outside the
    /// service radius and `ApiError::Validation` for other rejections.
    #[instrument(skip(self, session, order), fields(items = order.item_count()))]
    pub async fn create_order<S>(
        &self,
        session: &S,
        order: &NewOrder,
        attempt_key: Uuid,
    ) -> Result<Order, ApiError>
    where
        S: SessionStore + ?Sized,
    {
        let request = self
            .inner
            .http
            .post(self.endpoint(&["orders"])?)
            .header(IDEMPOTENCY_KEY_HEADER, attempt_key.to_string())
            .json(order);
        decode(self.send(session, request).await?).await
    }

    /// Every order (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admins.
    #[instrument(skip(self, session))]
    pub async fn list_orders<S>(&self, session: &S) -> Result<Vec<Order>, ApiError>
    where
        S: SessionStore + ?Sized,
    {
        let request = self.inner.http.get(self.endpoint(&["orders"])?);
        decode(self.send(session, request).await?).await
    }

    /// The caller's own orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session))]
    pub async fn list_my_orders<S>(&self, session: &S) -> Result<Vec<Order>, ApiError>
    where
        S: SessionStore + ?Sized,
    {
        let request = self.inner.http.get(self.endpoint(&["orders", "user"])?);
        decode(self.send(session, request).await?).await
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    /// Build `{base}/{segments..}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidBaseUrl)?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Send a request on behalf of the visitor owning `session`.
    ///
    /// Attaches the session's bearer token. A 401 clears the persisted auth
    /// record before returning `ApiError::Unauthorized`.
    async fn send<S>(&self, session: &S, request: RequestBuilder) -> Result<Response, ApiError>
    where
        S: SessionStore + ?Sized,
    {
        let token: Option<String> = session::read(session, keys::AUTH_TOKEN).await?;
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(ApiError::Network)?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(url = %response.url(), "API rejected session token, clearing session");
            session::clear_auth(session).await?;
            return Err(ApiError::Unauthorized);
        }

        check(response).await
    }
}

/// Pass success responses through, classify the rest.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let err = classify(status, &body);
    debug!(%status, error = %err, "API request failed");
    Err(err)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> FoodApiClient {
        FoodApiClient::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_appends_to_base_path() {
        let api = client("http://127.0.0.1:5000/api");
        assert_eq!(
            api.endpoint(&["food", "abc"]).unwrap().as_str(),
            "http://127.0.0.1:5000/api/food/abc"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let api = client("http://127.0.0.1:5000/api/");
        assert_eq!(
            api.endpoint(&["orders", "user"]).unwrap().as_str(),
            "http://127.0.0.1:5000/api/orders/user"
        );
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let api = client("http://127.0.0.1:5000/api");
        assert_eq!(
            api.endpoint(&["food", "a/b"]).unwrap().as_str(),
            "http://127.0.0.1:5000/api/food/a%2Fb"
        );
    }
}
