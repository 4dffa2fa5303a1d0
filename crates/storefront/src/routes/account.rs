//! Account pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::{instrument, warn};

use super::PageContext;
use super::orders::OrderView;
use crate::api::ApiError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::session::Notice;
use crate::state::AppState;

/// My orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct AccountOrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderView>,
}

/// Display the visitor's own orders.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<AccountOrdersTemplate, AppError> {
    let mut page = PageContext::load(&session).await?;

    let orders = match state.api().list_my_orders(&session).await {
        Ok(orders) => orders,
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            warn!(error = %e, "Failed to load orders");
            page.notice_if_none(Notice::error("Error loading orders", e.user_message()));
            Vec::new()
        }
    };

    Ok(AccountOrdersTemplate {
        page,
        orders: orders.iter().map(OrderView::from).collect(),
    })
}
