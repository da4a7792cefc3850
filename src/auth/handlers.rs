use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    accounts::services::AccountService,
    auth::dto::{AuthResponse, CredentialsRequest, PublicUser},
    error::AppResult,
    extract::JsonBody,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(accounts, payload))]
pub async fn register(
    State(accounts): State<AccountService>,
    JsonBody(payload): JsonBody<CredentialsRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (account, token) = accounts
        .register(&payload.username, &payload.password)
        .await?;
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&account),
    }))
}

#[instrument(skip(accounts, payload))]
pub async fn login(
    State(accounts): State<AccountService>,
    JsonBody(payload): JsonBody<CredentialsRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (account, token) = accounts
        .authenticate(&payload.username, &payload.password)
        .await?;
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&account),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn auth_response_serialization() {
        let response = AuthResponse {
            token: "t".into(),
            user: PublicUser {
                id: uuid::Uuid::new_v4(),
                username: "alice".into(),
                balance: Decimal::ZERO,
                is_admin: false,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["user"]["username"], "alice");
        assert_eq!(json["user"]["isAdmin"], false);
        assert!(json.get("token").is_some());
    }
}
