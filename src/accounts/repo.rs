use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Account, CreditOutcome, DebitOutcome, PurchaseRecord, SupportTicket};
use crate::error::RepoError;

/// Credential store and per-account ledger.
///
/// Accounts come back with their history and tickets loaded, in append order.
#[async_trait]
pub trait AccountRepo: Send + Sync {
    /// Fails with [`RepoError::Duplicate`] when the username is taken.
    async fn create_account(&self, username: &str, password_hash: &str)
        -> Result<Account, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError>;

    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError>;

    /// Adds `amount` to the named account unless the result would exceed
    /// [`max_balance`](super::repo_types::max_balance).
    async fn credit(&self, username: &str, amount: Decimal) -> Result<CreditOutcome, RepoError>;

    /// Decrements the balance by `record.amount` and appends `record`, both or
    /// neither. Never takes the balance below zero.
    async fn debit_for_purchase(
        &self,
        id: Uuid,
        record: PurchaseRecord,
    ) -> Result<DebitOutcome, RepoError>;

    /// `false` when the account does not exist.
    async fn append_ticket(&self, id: Uuid, ticket: SupportTicket) -> Result<bool, RepoError>;

    /// Every account, oldest first.
    async fn list_accounts(&self) -> Result<Vec<Account>, RepoError>;
}
