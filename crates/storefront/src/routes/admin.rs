//! Admin panel: catalog management and the order list.
//!
//! These pages are hidden from customers, but it is the food API that
//! refuses their mutations. Every mutation redirects to the dashboard,
//! which reloads foods and orders from the API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tiffin_buddy_core::{FoodId, FoodItem};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use super::PageContext;
use super::orders::OrderView;
use crate::api::ApiError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::services::catalog::{self, FoodForm, SaveFoodError};
use crate::session::{Notice, push_notice};
use crate::state::AppState;

/// A food row in the admin table.
#[derive(Clone)]
pub struct AdminFoodRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub image: Option<String>,
    pub available: bool,
}

impl From<&FoodItem> for AdminFoodRow {
    fn from(item: &FoodItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            price: item.price.to_string(),
            image: item.image.clone(),
            available: item.available,
        }
    }
}

/// Query parameters for the dashboard.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub tab: String,
    pub foods: Vec<AdminFoodRow>,
    pub orders: Vec<OrderView>,
}

/// Add/edit food form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/food_form.html")]
pub struct FoodFormTemplate {
    pub page: PageContext,
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub form: FoodForm,
    pub error: Option<String>,
}

/// Delete confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub page: PageContext,
    pub food: AdminFoodRow,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Display foods and orders.
#[instrument(skip(state, session, _admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Query(query): Query<DashboardQuery>,
) -> Result<DashboardTemplate, AppError> {
    let mut page = PageContext::load(&session).await?;

    let data = match catalog::load_dashboard(state.api(), &session).await {
        Ok(data) => data,
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            warn!(error = %e, "Failed to load admin dashboard");
            page.notice_if_none(Notice::error("Error loading data", e.user_message()));
            catalog::Dashboard::default()
        }
    };

    let tab = match query.tab.as_deref() {
        Some("orders") => "orders",
        _ => "foods",
    };

    Ok(DashboardTemplate {
        page,
        tab: tab.to_string(),
        foods: data.foods.iter().map(AdminFoodRow::from).collect(),
        orders: data.orders.iter().map(OrderView::from).collect(),
    })
}

// =============================================================================
// Create / Update
// =============================================================================

/// Display an empty food form.
#[instrument(skip(session, _admin))]
pub async fn new_food(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> Result<FoodFormTemplate, AppError> {
    Ok(FoodFormTemplate {
        page: PageContext::load(&session).await?,
        heading: "Add New Food Item",
        action: "/admin/foods".to_string(),
        submit_label: "Add Item",
        form: FoodForm::blank(),
        error: None,
    })
}

/// Handle the new food form.
#[instrument(skip(state, session, _admin, form))]
pub async fn create_food(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Form(form): Form<FoodForm>,
) -> Result<Response, AppError> {
    save(&state, &session, None, form).await
}

/// Display the food form pre-filled with an existing item.
#[instrument(skip(state, session, _admin))]
pub async fn edit_food(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<FoodId>,
) -> Result<Response, AppError> {
    let Some(food) = find_for_admin(&state, &session, &id).await? else {
        return Ok(Redirect::to("/admin").into_response());
    };

    Ok(FoodFormTemplate {
        page: PageContext::load(&session).await?,
        heading: "Edit Food Item",
        action: format!("/admin/foods/{id}"),
        submit_label: "Update Item",
        form: FoodForm::from_item(&food),
        error: None,
    }
    .into_response())
}

/// Handle the edit food form.
#[instrument(skip(state, session, _admin, form))]
pub async fn update_food(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<FoodId>,
    Form(form): Form<FoodForm>,
) -> Result<Response, AppError> {
    save(&state, &session, Some(&id), form).await
}

/// Save a food and go back to the dashboard, or re-show the form with the
/// problem.
async fn save(
    state: &AppState,
    session: &Session,
    existing: Option<&FoodId>,
    form: FoodForm,
) -> Result<Response, AppError> {
    let error = match catalog::save_food(state.api(), session, existing, &form).await {
        Ok(saved) => {
            let notice = if existing.is_some() {
                Notice::success("Food item updated", format!("{} was updated.", saved.name))
            } else {
                Notice::success("Food item added", format!("{} is on the menu.", saved.name))
            };
            push_notice(session, &notice).await?;
            return Ok(Redirect::to("/admin").into_response());
        }
        Err(SaveFoodError::Api(ApiError::Unauthorized)) => {
            return Err(ApiError::Unauthorized.into());
        }
        Err(SaveFoodError::Form(e)) => e.to_string(),
        Err(SaveFoodError::Api(e)) => {
            warn!(error = %e, "Failed to save food item");
            e.user_message()
        }
    };

    let (heading, action, submit_label) = match existing {
        Some(id) => ("Edit Food Item", format!("/admin/foods/{id}"), "Update Item"),
        None => ("Add New Food Item", "/admin/foods".to_string(), "Add Item"),
    };

    Ok(FoodFormTemplate {
        page: PageContext::load(session).await?,
        heading,
        action,
        submit_label,
        form,
        error: Some(error),
    }
    .into_response())
}

// =============================================================================
// Delete
// =============================================================================

/// Ask for confirmation before deleting.
#[instrument(skip(state, session, _admin))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<FoodId>,
) -> Result<Response, AppError> {
    let Some(food) = find_for_admin(&state, &session, &id).await? else {
        return Ok(Redirect::to("/admin").into_response());
    };

    Ok(ConfirmDeleteTemplate {
        page: PageContext::load(&session).await?,
        food: AdminFoodRow::from(&food),
    }
    .into_response())
}

/// Delete a food item after confirmation.
#[instrument(skip(state, session, _admin))]
pub async fn delete_food(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<FoodId>,
) -> Result<Redirect, AppError> {
    let notice = match state.api().delete_food(&session, &id).await {
        Ok(()) => {
            info!(food_id = %id, "Food item deleted");
            Notice::success("Food item deleted", "The item was removed from the menu.")
        }
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            warn!(error = %e, "Failed to delete food item");
            Notice::error("Error deleting food item", e.user_message())
        }
    };
    push_notice(&session, &notice).await?;
    Ok(Redirect::to("/admin"))
}

/// Look up `id` for an admin page.
///
/// `None` means a notice was queued and the caller should return to the
/// dashboard. Only an expired session is an error.
async fn find_for_admin(
    state: &AppState,
    session: &Session,
    id: &FoodId,
) -> Result<Option<FoodItem>, AppError> {
    let notice = match catalog::find_food(state.api(), session, id).await {
        Ok(Some(food)) => return Ok(Some(food)),
        Ok(None) => Notice::error("Food item not found", "It may have been deleted."),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            warn!(error = %e, food_id = %id, "Failed to load food item");
            Notice::error("Error loading food item", e.user_message())
        }
    };
    push_notice(session, &notice).await?;
    Ok(None)
}
