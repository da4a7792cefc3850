use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::{
    dto::AccountView,
    repo::AccountRepo,
    repo_types::{max_balance, Account, CreditOutcome, SupportTicket},
};
use crate::{
    auth::{
        claims::Identity,
        jwt::TokenKeys,
        password::{hash_password, verify_against_dummy, verify_password},
    },
    error::{AppError, AppResult},
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// Money amounts carry at most two fractional digits.
fn has_minor_unit_precision(amount: Decimal) -> bool {
    amount.normalize().scale() <= 2
}

fn identity_of(account: &Account) -> Identity {
    Identity {
        account_id: account.id,
        username: account.username.clone(),
        is_admin: account.is_admin,
    }
}

/// Registration, login and per-account operations.
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepo>,
    tokens: TokenKeys,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountRepo>, tokens: TokenKeys) -> Self {
        Self { accounts, tokens }
    }

    pub async fn register(&self, username: &str, password: &str) -> AppResult<(Account, String)> {
        if !is_valid_username(username) {
            return Err(AppError::Validation(
                "Username may contain only Latin letters, digits and underscores".into(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.accounts.find_by_username(username).await?.is_some() {
            warn!(%username, "username already registered");
            return Err(AppError::Conflict("User already exists".into()));
        }

        let hash = hash_password(password)?;
        // A racing registration surfaces here as RepoError::Duplicate -> Conflict.
        let account = self.accounts.create_account(username, &hash).await?;
        let token = self.tokens.issue(&identity_of(&account))?;

        info!(account_id = %account.id, %username, "account registered");
        Ok((account, token))
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<(Account, String)> {
        let Some(mut account) = self.accounts.find_by_username(username).await? else {
            verify_against_dummy(password);
            warn!(%username, "login for unknown username");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &account.password_hash)? {
            warn!(account_id = %account.id, "login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let now = OffsetDateTime::now_utc();
        self.accounts.touch_last_login(account.id, now).await?;
        account.last_login_at = Some(now);

        let token = self.tokens.issue(&identity_of(&account))?;
        info!(account_id = %account.id, "account logged in");
        Ok((account, token))
    }

    pub async fn profile(&self, identity: &Identity) -> AppResult<AccountView> {
        self.accounts
            .find_by_id(identity.account_id)
            .await?
            .map(AccountView::from)
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn adjust_balance(
        &self,
        actor: &Identity,
        target_username: &str,
        amount: Option<Decimal>,
    ) -> AppResult<Decimal> {
        actor.require_admin()?;

        let amount = match amount {
            Some(a) if a > Decimal::ZERO && has_minor_unit_precision(a) => a,
            _ => return Err(AppError::Validation("Invalid username or amount".into())),
        };
        if target_username.is_empty() {
            return Err(AppError::Validation("Invalid username or amount".into()));
        }
        if amount > max_balance() {
            return Err(AppError::Validation(format!(
                "Amount may not exceed {}",
                max_balance()
            )));
        }

        let balance = match self.accounts.credit(target_username, amount).await? {
            CreditOutcome::Credited { balance } => balance,
            CreditOutcome::LimitExceeded { balance } => {
                warn!(target = %target_username, %amount, %balance, "top-up would exceed balance ceiling");
                return Err(AppError::Validation(format!(
                    "Balance may not exceed {}",
                    max_balance()
                )));
            }
            CreditOutcome::AccountMissing => {
                return Err(AppError::NotFound("User not found".into()))
            }
        };

        info!(admin = %actor.username, target = %target_username, %amount, %balance, "balance credited");
        Ok(balance)
    }

    pub async fn submit_ticket(
        &self,
        identity: &Identity,
        subject: &str,
        message: &str,
    ) -> AppResult<()> {
        if subject.trim().is_empty() || message.trim().is_empty() {
            return Err(AppError::Validation("Subject and message are required".into()));
        }
        let ticket = SupportTicket {
            subject: subject.to_string(),
            message: message.to_string(),
            timestamp: OffsetDateTime::now_utc(),
        };
        if !self.accounts.append_ticket(identity.account_id, ticket).await? {
            return Err(AppError::NotFound("User not found".into()));
        }
        info!(account_id = %identity.account_id, "support ticket submitted");
        Ok(())
    }
}
