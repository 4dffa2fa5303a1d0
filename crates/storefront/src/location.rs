//! Delivery location capability.
//!
//! The browser owns the geolocation API, so the storefront only sees what
//! the checkout form reports: coordinates plus the times they were captured
//! and submitted, or an error code. Both times come from the browser's
//! clock, so the age of a fix never depends on the server's. [`LocationProvider`] abstracts that source so the
//! order flow can be driven by [`FixedLocation`] in tests.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiffin_buddy_core::{Coordinates, CoordinatesError};

/// How long acquisition may take before it counts as a failure.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Oldest cached fix that is still accepted.
pub const MAX_LOCATION_AGE: Duration = Duration::from_secs(60);

/// Geolocation request options, also handed to the browser script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: LOCATION_TIMEOUT,
            maximum_age: MAX_LOCATION_AGE,
        }
    }
}

impl LocationOptions {
    /// Timeout in milliseconds, as `navigator.geolocation` expects.
    #[must_use]
    pub fn timeout_ms(&self) -> u128 {
        self.timeout.as_millis()
    }

    /// Maximum age in milliseconds, as `navigator.geolocation` expects.
    #[must_use]
    pub fn maximum_age_ms(&self) -> u128 {
        self.maximum_age.as_millis()
    }
}

/// A position and when it was taken.
///
/// `captured_at` and `observed_at` are read from the provider's clock,
/// which need not agree with the server's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub coordinates: Coordinates,
    pub captured_at: DateTime<Utc>,
    /// When the provider handed the fix over.
    pub observed_at: DateTime<Utc>,
}

impl LocationFix {
    /// A fix taken and reported just now.
    #[must_use]
    pub fn now(coordinates: Coordinates) -> Self {
        let now = Utc::now();
        Self {
            coordinates,
            captured_at: now,
            observed_at: now,
        }
    }

    /// How old the fix was when it was reported.
    #[must_use]
    pub fn age(&self) -> chrono::Duration {
        self.observed_at.signed_duration_since(self.captured_at)
    }
}

/// Why no usable location is available.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("location permission was denied")]
    PermissionDenied,

    #[error("geolocation is not supported by this browser")]
    Unsupported,

    #[error("location is unavailable")]
    Unavailable,

    #[error("timed out waiting for location")]
    Timeout,

    /// The fix is older than the accepted maximum age.
    #[error("location fix is {age_secs}s old")]
    Stale { age_secs: i64 },

    #[error("invalid coordinates: {0}")]
    Invalid(#[from] CoordinatesError),
}

impl LocationError {
    /// Message suitable for showing to the visitor.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Please allow location access so we can check that we deliver to you."
            }
            Self::Unsupported => "Your browser does not support location services.",
            Self::Unavailable | Self::Invalid(_) => {
                "We could not determine your location. Please try again."
            }
            Self::Timeout => "Getting your location took too long. Please try again.",
            Self::Stale { .. } => "Your location is out of date. Please try again.",
        }
    }
}

/// Source of the visitor's current position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Produce a fix honouring `options` where the source can.
    async fn current_location(&self, options: &LocationOptions)
    -> Result<LocationFix, LocationError>;
}

/// Acquire a location within the timeout and reject stale fixes.
///
/// Failure is final for this attempt; nothing is retried.
///
/// # Errors
///
/// Returns `LocationError::Timeout` if the provider does not answer within
/// `options.timeout`, `LocationError::Stale` for a fix older than
/// `options.maximum_age`, or whatever the provider reported.
pub async fn acquire<P>(provider: &P, options: &LocationOptions) -> Result<Coordinates, LocationError>
where
    P: LocationProvider + ?Sized,
{
    let fix = tokio::time::timeout(options.timeout, provider.current_location(options))
        .await
        .map_err(|_| LocationError::Timeout)??;

    let age = fix.age();
    let max_age = chrono::Duration::from_std(options.maximum_age).unwrap_or(chrono::Duration::MAX);
    if age > max_age {
        return Err(LocationError::Stale {
            age_secs: age.num_seconds(),
        });
    }

    Ok(fix.coordinates)
}

// =============================================================================
// Browser-reported location
// =============================================================================

/// Location fields posted by the checkout form.
///
/// The page script fills either `lat`/`lng`/`captured_at`/`submitted_at`
/// (milliseconds since the epoch, browser clock) or `location_error`.
/// Hidden inputs arrive as strings, possibly empty. A missing
/// `submitted_at` leaves freshness to the browser's `maximumAge`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmittedLocation {
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lng: String,
    #[serde(default)]
    pub captured_at: String,
    #[serde(default)]
    pub submitted_at: String,
    #[serde(default)]
    pub location_error: String,
}

impl SubmittedLocation {
    /// A successful fix, as the page script would post it.
    #[must_use]
    pub fn from_fix(fix: &LocationFix) -> Self {
        Self {
            lat: fix.coordinates.lat.to_string(),
            lng: fix.coordinates.lng.to_string(),
            captured_at: fix.captured_at.timestamp_millis().to_string(),
            submitted_at: fix.observed_at.timestamp_millis().to_string(),
            location_error: String::new(),
        }
    }

    /// A failure code, as the page script would post it.
    #[must_use]
    pub fn from_error_code(code: &str) -> Self {
        Self {
            location_error: code.to_string(),
            ..Self::default()
        }
    }

    fn to_fix(&self) -> Result<LocationFix, LocationError> {
        match self.location_error.trim() {
            "" => {}
            "permission_denied" => return Err(LocationError::PermissionDenied),
            "unsupported" => return Err(LocationError::Unsupported),
            "timeout" => return Err(LocationError::Timeout),
            _ => return Err(LocationError::Unavailable),
        }

        let lat = parse_field::<f64>(&self.lat)?;
        let lng = parse_field::<f64>(&self.lng)?;
        let coordinates = Coordinates::new(lat, lng)?;
        let captured_at = parse_millis(&self.captured_at)?;
        let observed_at = if self.submitted_at.trim().is_empty() {
            captured_at
        } else {
            parse_millis(&self.submitted_at)?
        };

        Ok(LocationFix {
            coordinates,
            captured_at,
            observed_at,
        })
    }
}

fn parse_millis(value: &str) -> Result<DateTime<Utc>, LocationError> {
    Utc.timestamp_millis_opt(parse_field::<i64>(value)?)
        .single()
        .ok_or(LocationError::Unavailable)
}

fn parse_field<T: std::str::FromStr>(value: &str) -> Result<T, LocationError> {
    value.trim().parse().map_err(|_| LocationError::Unavailable)
}

#[async_trait]
impl LocationProvider for SubmittedLocation {
    async fn current_location(
        &self,
        _options: &LocationOptions,
    ) -> Result<LocationFix, LocationError> {
        self.to_fix()
    }
}

// =============================================================================
// Fixed location
// =============================================================================

/// A provider that always answers the same way.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    result: Result<LocationFix, LocationError>,
    delay: Duration,
}

impl FixedLocation {
    /// Always report `coordinates`, captured now.
    #[must_use]
    pub fn at(coordinates: Coordinates) -> Self {
        Self {
            result: Ok(LocationFix::now(coordinates)),
            delay: Duration::ZERO,
        }
    }

    /// Always report `fix` as given.
    #[must_use]
    pub const fn fix(fix: LocationFix) -> Self {
        Self {
            result: Ok(fix),
            delay: Duration::ZERO,
        }
    }

    /// Always fail with `error`.
    #[must_use]
    pub const fn failing(error: LocationError) -> Self {
        Self {
            result: Err(error),
            delay: Duration::ZERO,
        }
    }

    /// Answer only after `delay`.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(
        &self,
        _options: &LocationOptions,
    ) -> Result<LocationFix, LocationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}
