use std::sync::Arc;

use rust_decimal::Decimal;
use time::OffsetDateTime;

use super::dto::{AdminTicket, DashboardStats};
use crate::{
    accounts::{dto::AccountView, repo::AccountRepo, repo_types::Account},
    auth::claims::Identity,
    error::AppResult,
};

/// Read-side fan-out over all accounts. Every call is admin-gated.
#[derive(Clone)]
pub struct AdminService {
    accounts: Arc<dyn AccountRepo>,
}

impl AdminService {
    pub fn new(accounts: Arc<dyn AccountRepo>) -> Self {
        Self { accounts }
    }

    pub async fn list_accounts(&self, identity: &Identity) -> AppResult<Vec<AccountView>> {
        identity.require_admin()?;
        let accounts = self.accounts.list_accounts().await?;
        Ok(accounts.into_iter().map(AccountView::from).collect())
    }

    pub async fn list_tickets(&self, identity: &Identity) -> AppResult<Vec<AdminTicket>> {
        identity.require_admin()?;
        let accounts = self.accounts.list_accounts().await?;
        Ok(flatten_tickets(accounts))
    }

    pub async fn dashboard(&self, identity: &Identity) -> AppResult<DashboardStats> {
        identity.require_admin()?;
        let accounts = self.accounts.list_accounts().await?;
        Ok(compute_stats(&accounts, OffsetDateTime::now_utc()))
    }
}

/// Account enumeration order first, then ticket append order.
fn flatten_tickets(accounts: Vec<Account>) -> Vec<AdminTicket> {
    accounts
        .into_iter()
        .flat_map(|a| {
            let (account_id, username) = (a.id, a.username);
            a.tickets.into_iter().map(move |t| AdminTicket {
                account_id,
                username: username.clone(),
                subject: t.subject,
                message: t.message,
                timestamp: t.timestamp,
            })
        })
        .collect()
}

/// "Active today" means a login on the same UTC calendar day as `now`.
fn compute_stats(accounts: &[Account], now: OffsetDateTime) -> DashboardStats {
    let today = now.date();
    DashboardStats {
        total_users: accounts.len(),
        active_today: accounts
            .iter()
            .filter(|a| a.last_login_at.is_some_and(|t| t.to_offset(now.offset()).date() == today))
            .count(),
        total_orders: accounts.iter().map(|a| a.history.len()).sum(),
        total_balance: accounts
            .iter()
            .fold(Decimal::ZERO, |sum, a| sum.saturating_add(a.balance)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        accounts::repo_types::{PurchaseRecord, SupportTicket},
        error::AppError,
        memory::MemoryStore,
    };
    use time::{macros::datetime, Duration};
    use uuid::Uuid;

    fn account(name: &str) -> Account {
        Account {
            id: Uuid::new_v4(),
            username: name.into(),
            password_hash: String::new(),
            balance: Decimal::ZERO,
            is_admin: false,
            joined_at: datetime!(2026-01-01 0:00 UTC),
            last_login_at: None,
            history: Vec::new(),
            tickets: Vec::new(),
        }
    }

    fn ticket(subject: &str) -> SupportTicket {
        SupportTicket {
            subject: subject.into(),
            message: "help".into(),
            timestamp: datetime!(2026-01-02 10:00 UTC),
        }
    }

    fn identity(is_admin: bool) -> Identity {
        Identity {
            account_id: Uuid::new_v4(),
            username: "someone".into(),
            is_admin,
        }
    }

    #[test]
    fn tickets_flatten_in_account_then_append_order() {
        let mut a = account("alice");
        a.tickets = vec![ticket("a1"), ticket("a2")];
        let b = account("bob");
        let mut c = account("carol");
        c.tickets = vec![ticket("c1")];

        let flat = flatten_tickets(vec![a.clone(), b, c]);
        let pairs: Vec<_> = flat
            .iter()
            .map(|t| (t.username.as_str(), t.subject.as_str()))
            .collect();
        assert_eq!(pairs, [("alice", "a1"), ("alice", "a2"), ("carol", "c1")]);
        assert_eq!(flat[0].account_id, a.id);
    }

    #[test]
    fn stats_are_derived_from_accounts() {
        let now = datetime!(2026-03-10 15:00 UTC);

        let mut a = account("alice");
        a.balance = Decimal::from(96);
        a.last_login_at = Some(now - Duration::hours(2));
        a.history.push(PurchaseRecord {
            service_name: "x".into(),
            amount: Decimal::from(104),
            timestamp: now,
        });

        let mut b = account("bob");
        b.balance = Decimal::new(1050, 2);
        b.last_login_at = Some(now - Duration::days(1));

        let c = account("carol");

        let stats = compute_stats(&[a, b, c], now);
        assert_eq!(
            stats,
            DashboardStats {
                total_users: 3,
                active_today: 1,
                total_orders: 1,
                total_balance: Decimal::new(10650, 2),
            }
        );
    }

    #[test]
    fn total_balance_saturates_instead_of_overflowing() {
        let mut a = account("alice");
        a.balance = Decimal::MAX;
        let mut b = account("bob");
        b.balance = Decimal::MAX;

        let stats = compute_stats(&[a, b], datetime!(2026-03-10 15:00 UTC));
        assert_eq!(stats.total_balance, Decimal::MAX);
    }

    #[tokio::test]
    async fn every_admin_view_rejects_non_admins() {
        let svc = AdminService::new(Arc::new(MemoryStore::new()));
        let user = identity(false);
        assert!(matches!(svc.list_accounts(&user).await, Err(AppError::Forbidden)));
        assert!(matches!(svc.list_tickets(&user).await, Err(AppError::Forbidden)));
        assert!(matches!(svc.dashboard(&user).await, Err(AppError::Forbidden)));

        let admin = identity(true);
        assert!(svc.list_accounts(&admin).await.unwrap().is_empty());
        assert_eq!(svc.dashboard(&admin).await.unwrap().total_users, 0);
    }
}
