//! Admin catalog management.

use serde::Deserialize;
use thiserror::Error;
use tiffin_buddy_core::{
    FoodId, FoodItem, FoodItemPatch, NewFoodItem, Order, Price, PriceError,
};
use tracing::{info, instrument};

use crate::api::{ApiError, FoodApiClient};
use crate::session::SessionStore;

/// Everything the admin dashboard shows.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub foods: Vec<FoodItem>,
    pub orders: Vec<Order>,
}

/// Load the full catalog and every order concurrently.
///
/// # Errors
///
/// Returns the first failing request's error.
#[instrument(skip_all)]
pub async fn load_dashboard<S>(api: &FoodApiClient, session: &S) -> Result<Dashboard, ApiError>
where
    S: SessionStore + ?Sized,
{
    let (foods, orders) = tokio::try_join!(api.list_foods(session), api.list_orders(session))?;
    Ok(Dashboard { foods, orders })
}

/// Look up one food item in the catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
pub async fn find_food<S>(
    api: &FoodApiClient,
    session: &S,
    id: &FoodId,
) -> Result<Option<FoodItem>, ApiError>
where
    S: SessionStore + ?Sized,
{
    let foods = api.list_foods(session).await?;
    Ok(foods.into_iter().find(|food| &food.id == id))
}

// =============================================================================
// Food form
// =============================================================================

/// Problems with a submitted food form.
#[derive(Debug, Error, PartialEq)]
pub enum FoodFormError {
    #[error("Name is required")]
    MissingName,

    #[error("Category is required")]
    MissingCategory,

    #[error("Price must be a non-negative number")]
    Price(#[from] PriceError),
}

/// The admin food form as posted.
///
/// `available` is a checkbox: present when ticked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub available: Option<String>,
}

impl FoodForm {
    /// A blank form for a new item, available by default.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            available: Some("on".to_string()),
            ..Self::default()
        }
    }

    /// A form pre-filled from an existing item.
    #[must_use]
    pub fn from_item(item: &FoodItem) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.amount().normalize().to_string(),
            category: item.category.clone(),
            image: item.image.clone().unwrap_or_default(),
            available: item.available.then(|| "on".to_string()),
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available.is_some()
    }

    /// Validate into a create request. An empty image means no image.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn to_new_item(&self) -> Result<NewFoodItem, FoodFormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FoodFormError::MissingName);
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err(FoodFormError::MissingCategory);
        }
        let price: Price = self.price.parse()?;
        let image = Some(self.image.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        Ok(NewFoodItem {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            category: category.to_string(),
            image,
            available: self.is_available(),
        })
    }

    /// Validate into an update request.
    ///
    /// Every field is sent; an empty image clears the stored one.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn to_patch(&self) -> Result<FoodItemPatch, FoodFormError> {
        let item = self.to_new_item()?;
        let image = item.image.clone().unwrap_or_default();
        Ok(FoodItemPatch {
            image: Some(image),
            ..FoodItemPatch::from(item)
        })
    }
}

/// Why saving a food item failed.
#[derive(Debug, Error)]
pub enum SaveFoodError {
    #[error(transparent)]
    Form(#[from] FoodFormError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Create a food item, or update `existing` when given.
///
/// # Errors
///
/// Returns `SaveFoodError::Form` without calling the API when the form is
/// invalid.
#[instrument(skip(api, session, form), fields(name = %form.name))]
pub async fn save_food<S>(
    api: &FoodApiClient,
    session: &S,
    existing: Option<&FoodId>,
    form: &FoodForm,
) -> Result<FoodItem, SaveFoodError>
where
    S: SessionStore + ?Sized,
{
    let saved = match existing {
        Some(id) => api.update_food(session, id, &form.to_patch()?).await?,
        None => api.create_food(session, &form.to_new_item()?).await?,
    };
    info!(food_id = %saved.id, "Food item saved");
    Ok(saved)
}
