//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiError, FoodApiClient};
use crate::config::StorefrontConfig;
use crate::location::LocationOptions;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: FoodApiClient,
    location_options: LocationOptions,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = FoodApiClient::new(config.api_base_url.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                location_options: LocationOptions::default(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the food API client.
    #[must_use]
    pub fn api(&self) -> &FoodApiClient {
        &self.inner.api
    }

    /// Geolocation options for checkout.
    #[must_use]
    pub fn location_options(&self) -> &LocationOptions {
        &self.inner.location_options
    }
}
