use std::sync::Arc;

use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    accounts::{
        repo::AccountRepo,
        repo_types::{DebitOutcome, PurchaseRecord},
    },
    auth::claims::Identity,
    catalog::repo::ProductRepo,
    error::{AppError, AppResult},
};

/// Outcome of a committed purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub product_name: String,
    pub balance: Decimal,
}

/// Resolve product, check funds, debit and record, as one step.
#[derive(Clone)]
pub struct PurchaseService {
    accounts: Arc<dyn AccountRepo>,
    products: Arc<dyn ProductRepo>,
}

impl PurchaseService {
    pub fn new(accounts: Arc<dyn AccountRepo>, products: Arc<dyn ProductRepo>) -> Self {
        Self { accounts, products }
    }

    /// `product_id` arrives as raw client input; an unparseable id is just
    /// a product that does not exist.
    pub async fn purchase(&self, identity: &Identity, product_id: &str) -> AppResult<Receipt> {
        let product = match Uuid::parse_str(product_id.trim()) {
            Ok(id) => self.products.find_product(id).await?,
            Err(_) => None,
        }
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;

        let record = PurchaseRecord {
            service_name: product.name.clone(),
            amount: product.price,
            timestamp: OffsetDateTime::now_utc(),
        };

        match self
            .accounts
            .debit_for_purchase(identity.account_id, record)
            .await?
        {
            DebitOutcome::Committed { balance } => {
                info!(
                    account_id = %identity.account_id,
                    product_id = %product.id,
                    price = %product.price,
                    %balance,
                    "purchase committed"
                );
                Ok(Receipt {
                    product_name: product.name,
                    balance,
                })
            }
            DebitOutcome::InsufficientFunds { balance } => {
                warn!(
                    account_id = %identity.account_id,
                    price = %product.price,
                    %balance,
                    "insufficient funds"
                );
                Err(AppError::InsufficientFunds {
                    required: product.price,
                })
            }
            DebitOutcome::AccountMissing => Err(AppError::NotFound("User not found".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{repo_types::Product, services::CatalogService},
        memory::MemoryStore,
    };

    async fn setup() -> (PurchaseService, Arc<MemoryStore>, Identity, Vec<Product>) {
        let store = Arc::new(MemoryStore::new());
        CatalogService::new(store.clone()).seed().await.unwrap();
        let products = store.list_products().await.unwrap();
        let account = store.create_account("alice", "hash").await.unwrap();
        let identity = Identity {
            account_id: account.id,
            username: account.username,
            is_admin: false,
        };
        (
            PurchaseService::new(store.clone(), store.clone()),
            store,
            identity,
            products,
        )
    }

    #[tokio::test]
    async fn purchase_fails_without_funds_and_changes_nothing() {
        let (svc, store, alice, products) = setup().await;
        let cheapest = &products[0];

        let err = svc.purchase(&alice, &cheapest.id.to_string()).await.unwrap_err();
        match err {
            AppError::InsufficientFunds { required } => assert_eq!(required, cheapest.price),
            other => panic!("unexpected error: {other:?}"),
        }

        let after = store.find_by_id(alice.account_id).await.unwrap().unwrap();
        assert_eq!(after.balance, Decimal::ZERO);
        assert!(after.history.is_empty());
    }

    #[tokio::test]
    async fn purchase_debits_and_snapshots_product() {
        let (svc, store, alice, products) = setup().await;
        store.credit("alice", Decimal::from(200)).await.unwrap();
        let product = &products[0];

        let receipt = svc.purchase(&alice, &product.id.to_string()).await.unwrap();
        assert_eq!(receipt.balance, Decimal::from(96));
        assert_eq!(receipt.product_name, product.name);

        let after = store.find_by_id(alice.account_id).await.unwrap().unwrap();
        assert_eq!(after.balance, Decimal::from(96));
        assert_eq!(after.history.len(), 1);
        assert_eq!(after.history[0].amount, Decimal::from(104));
        assert_eq!(after.history[0].service_name, product.name);
    }

    #[tokio::test]
    async fn unknown_or_garbage_product_is_not_found() {
        let (svc, _, alice, _) = setup().await;
        assert!(matches!(
            svc.purchase(&alice, &Uuid::new_v4().to_string()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.purchase(&alice, "507f1f77bcf86cd799439011").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn exact_balance_can_be_spent() {
        let (svc, store, alice, products) = setup().await;
        store.credit("alice", Decimal::from(104)).await.unwrap();
        let receipt = svc.purchase(&alice, &products[0].id.to_string()).await.unwrap();
        assert_eq!(receipt.balance, Decimal::ZERO);
    }
}
