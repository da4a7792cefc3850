use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AccountView, AddBalanceRequest, BalanceResponse, MessageResponse, SupportRequest},
    services::AccountService,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    extract::{parse_json, JsonBody},
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/balance/add", post(add_balance))
        .route("/support", post(submit_ticket))
}

#[instrument(skip(accounts, identity), fields(account_id = %identity.account_id))]
pub async fn get_me(
    State(accounts): State<AccountService>,
    AuthUser(identity): AuthUser,
) -> AppResult<Json<AccountView>> {
    Ok(Json(accounts.profile(&identity).await?))
}

#[instrument(skip(accounts, identity, body), fields(admin = %identity.username))]
pub async fn add_balance(
    State(accounts): State<AccountService>,
    AuthUser(identity): AuthUser,
    body: Bytes,
) -> AppResult<Json<BalanceResponse>> {
    // Non-admins are refused before the body is looked at.
    identity.require_admin()?;
    let payload: AddBalanceRequest = parse_json(&body)?;
    let balance = accounts
        .adjust_balance(&identity, &payload.username, payload.amount)
        .await?;
    let amount = payload.amount.unwrap_or_default();
    Ok(Json(BalanceResponse {
        message: format!("+{amount} RUB added to {}", payload.username),
        balance,
    }))
}

#[instrument(skip(accounts, identity, payload), fields(account_id = %identity.account_id))]
pub async fn submit_ticket(
    State(accounts): State<AccountService>,
    AuthUser(identity): AuthUser,
    JsonBody(payload): JsonBody<SupportRequest>,
) -> AppResult<Json<MessageResponse>> {
    accounts
        .submit_ticket(&identity, &payload.subject, &payload.message)
        .await?;
    Ok(Json(MessageResponse {
        message: "Ticket submitted. We will reply within 24 hours.".into(),
    }))
}
