use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    accounts::{repo::AccountRepo, services::AccountService},
    admin::services::AdminService,
    auth::jwt::TokenKeys,
    catalog::{repo::ProductRepo, services::CatalogService},
    config::AppConfig,
    db::PgStore,
    memory::MemoryStore,
    purchases::services::PurchaseService,
};

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountRepo>,
    pub products: Arc<dyn ProductRepo>,
    pub config: Arc<AppConfig>,
    pub tokens: TokenKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let state = match config.database_url.as_deref() {
            Some(url) => {
                let store = Arc::new(PgStore::connect(url, config.db_max_connections).await?);
                tracing::info!("using postgres store");
                Self::from_parts(store.clone(), store, config)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                Self::from_parts(store.clone(), store, config)
            }
        };
        Ok(state)
    }

    pub fn from_parts(
        accounts: Arc<dyn AccountRepo>,
        products: Arc<dyn ProductRepo>,
        config: Arc<AppConfig>,
    ) -> Self {
        let tokens = TokenKeys::new(&config.jwt);
        Self {
            accounts,
            products,
            config,
            tokens,
        }
    }

    #[cfg(test)]
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: crate::config::DEFAULT_TOKEN_TTL_MINUTES,
            },
        });
        Self::from_parts(store.clone(), store, config)
    }
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl FromRef<AppState> for AccountService {
    fn from_ref(state: &AppState) -> Self {
        AccountService::new(state.accounts.clone(), state.tokens.clone())
    }
}

impl FromRef<AppState> for CatalogService {
    fn from_ref(state: &AppState) -> Self {
        CatalogService::new(state.products.clone())
    }
}

impl FromRef<AppState> for PurchaseService {
    fn from_ref(state: &AppState) -> Self {
        PurchaseService::new(state.accounts.clone(), state.products.clone())
    }
}

impl FromRef<AppState> for AdminService {
    fn from_ref(state: &AppState) -> Self {
        AdminService::new(state.accounts.clone())
    }
}
