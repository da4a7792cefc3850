use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{repo_types::Product, services::CatalogService};
use crate::{error::AppResult, state::AppState};

pub fn catalog_routes() -> Router<AppState> {
    Router::new().route("/products", get(list_products))
}

#[instrument(skip(catalog))]
pub async fn list_products(State(catalog): State<CatalogService>) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(catalog.list().await?))
}
