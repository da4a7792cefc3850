use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tracing::instrument;

use super::services::PurchaseService;
use crate::{
    accounts::dto::BalanceResponse, auth::extractors::AuthUser, error::AppResult,
    extract::JsonBody, state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequest {
    #[serde(default)]
    pub product_id: String,
}

pub fn purchase_routes() -> Router<AppState> {
    Router::new().route("/buy", post(buy))
}

#[instrument(skip(purchases, identity), fields(account_id = %identity.account_id))]
pub async fn buy(
    State(purchases): State<PurchaseService>,
    AuthUser(identity): AuthUser,
    JsonBody(payload): JsonBody<BuyRequest>,
) -> AppResult<Json<BalanceResponse>> {
    let receipt = purchases.purchase(&identity, &payload.product_id).await?;
    Ok(Json(BalanceResponse {
        message: format!("Purchased: {}", receipt.product_name),
        balance: receipt.balance,
    }))
}
