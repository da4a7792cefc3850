use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{
    dto::{AdminTicket, DashboardStats},
    services::AdminService,
};
use crate::{
    accounts::dto::AccountView, auth::extractors::AuthUser, error::AppResult, state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/tickets", get(list_tickets))
        .route("/admin/stats", get(stats))
}

#[instrument(skip(admin, identity), fields(actor = %identity.username))]
pub async fn list_users(
    State(admin): State<AdminService>,
    AuthUser(identity): AuthUser,
) -> AppResult<Json<Vec<AccountView>>> {
    Ok(Json(admin.list_accounts(&identity).await?))
}

#[instrument(skip(admin, identity), fields(actor = %identity.username))]
pub async fn list_tickets(
    State(admin): State<AdminService>,
    AuthUser(identity): AuthUser,
) -> AppResult<Json<Vec<AdminTicket>>> {
    Ok(Json(admin.list_tickets(&identity).await?))
}

#[instrument(skip(admin, identity), fields(actor = %identity.username))]
pub async fn stats(
    State(admin): State<AdminService>,
    AuthUser(identity): AuthUser,
) -> AppResult<Json<DashboardStats>> {
    Ok(Json(admin.dashboard(&identity).await?))
}
