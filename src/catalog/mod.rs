pub mod handlers;
pub mod repo;
pub mod repo_types;
pub(crate) mod seed;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::catalog_routes()
}
