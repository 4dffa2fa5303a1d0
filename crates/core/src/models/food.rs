//! Catalog items.

use serde::{Deserialize, Serialize};

use crate::types::{FoodId, Price};

/// A menu item as served by `GET /food`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    #[serde(rename = "_id")]
    pub id: FoodId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

/// Body of `POST /food`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFoodItem {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub available: bool,
}

/// Body of `PUT /food/{id}`. Absent fields are left unchanged by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl From<NewFoodItem> for FoodItemPatch {
    /// A full replacement expressed as a patch (the admin form always sends
    /// every field).
    fn from(item: NewFoodItem) -> Self {
        Self {
            name: Some(item.name),
            description: Some(item.description),
            price: Some(item.price),
            category: Some(item.category),
            image: item.image,
            available: Some(item.available),
        }
    }
}

/// The customer-facing listing: unavailable items are hidden.
///
/// The admin panel shows the unfiltered list.
#[must_use]
pub fn available_only(items: Vec<FoodItem>) -> Vec<FoodItem> {
    items.into_iter().filter(|item| item.available).collect()
}
