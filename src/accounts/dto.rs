use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Account, PurchaseRecord, SupportTicket};

/// Account as shown to its owner and to admins. No password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
    pub history: Vec<PurchaseView>,
    pub tickets: Vec<TicketView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseView {
    pub service_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct TicketView {
    pub subject: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<PurchaseRecord> for PurchaseView {
    fn from(r: PurchaseRecord) -> Self {
        Self {
            service_name: r.service_name,
            amount: r.amount,
            timestamp: r.timestamp,
        }
    }
}

impl From<SupportTicket> for TicketView {
    fn from(t: SupportTicket) -> Self {
        Self {
            subject: t.subject,
            message: t.message,
            timestamp: t.timestamp,
        }
    }
}

impl From<Account> for AccountView {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            username: a.username,
            balance: a.balance,
            is_admin: a.is_admin,
            joined_at: a.joined_at,
            last_login_at: a.last_login_at,
            history: a.history.into_iter().map(PurchaseView::from).collect(),
            tickets: a.tickets.into_iter().map(TicketView::from).collect(),
        }
    }
}

/// Request body for an admin balance top-up.
#[derive(Debug, Deserialize)]
pub struct AddBalanceRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Request body for a support ticket.
#[derive(Debug, Deserialize)]
pub struct SupportRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}
