use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    accounts::{
        repo::AccountRepo,
        repo_types::{
            max_balance, Account, CreditOutcome, DebitOutcome, PurchaseRecord, SupportTicket,
        },
    },
    catalog::{
        repo::ProductRepo,
        repo_types::{NewProduct, Product},
    },
    error::RepoError,
};

/// Process-local store. State is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<Vec<Account>>,
    products: RwLock<Vec<Product>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stand-in for out-of-band admin provisioning.
    #[cfg(test)]
    pub async fn grant_admin(&self, username: &str) -> bool {
        let mut accounts = self.accounts.write().await;
        match accounts.iter_mut().find(|a| a.username == username) {
            Some(a) => {
                a.is_admin = true;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl AccountRepo for MemoryStore {
    async fn create_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Account, RepoError> {
        let mut accounts = self.accounts.write().await;
        if accounts.iter().any(|a| a.username == username) {
            return Err(RepoError::Duplicate);
        }
        let account = Account {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            balance: Decimal::ZERO,
            is_admin: false,
            joined_at: OffsetDateTime::now_utc(),
            last_login_at: None,
            history: Vec::new(),
            tickets: Vec::new(),
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, RepoError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        let mut accounts = self.accounts.write().await;
        if let Some(a) = accounts.iter_mut().find(|a| a.id == id) {
            a.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn credit(&self, username: &str, amount: Decimal) -> Result<CreditOutcome, RepoError> {
        let mut accounts = self.accounts.write().await;
        let Some(account) = accounts.iter_mut().find(|a| a.username == username) else {
            return Ok(CreditOutcome::AccountMissing);
        };
        match account
            .balance
            .checked_add(amount)
            .filter(|b| *b <= max_balance())
        {
            Some(balance) => {
                account.balance = balance;
                Ok(CreditOutcome::Credited { balance })
            }
            None => Ok(CreditOutcome::LimitExceeded {
                balance: account.balance,
            }),
        }
    }

    async fn debit_for_purchase(
        &self,
        id: Uuid,
        record: PurchaseRecord,
    ) -> Result<DebitOutcome, RepoError> {
        // Check and mutation happen under one write guard.
        let mut accounts = self.accounts.write().await;
        let Some(account) = accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(DebitOutcome::AccountMissing);
        };
        if account.balance < record.amount {
            return Ok(DebitOutcome::InsufficientFunds {
                balance: account.balance,
            });
        }
        account.balance -= record.amount;
        account.history.push(record);
        Ok(DebitOutcome::Committed {
            balance: account.balance,
        })
    }

    async fn append_ticket(&self, id: Uuid, ticket: SupportTicket) -> Result<bool, RepoError> {
        let mut accounts = self.accounts.write().await;
        match accounts.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.tickets.push(ticket);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, RepoError> {
        Ok(self.accounts.read().await.clone())
    }
}

#[async_trait]
impl ProductRepo for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        Ok(self.products.read().await.clone())
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn seed_if_empty(&self, products: Vec<NewProduct>) -> Result<usize, RepoError> {
        let mut catalog = self.products.write().await;
        if !catalog.is_empty() {
            return Ok(0);
        }
        catalog.extend(products.into_iter().map(|p| Product {
            id: Uuid::new_v4(),
            name: p.name,
            price: p.price,
            description: p.description,
            external_link: p.external_link,
        }));
        Ok(catalog.len())
    }
}
