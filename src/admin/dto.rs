use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// A support ticket with its owner attached, for the admin inbox.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminTicket {
    pub account_id: Uuid,
    pub username: String,
    pub subject: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Dashboard numbers, recomputed on each request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: usize,
    pub active_today: usize,
    pub total_orders: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_balance: Decimal,
}
