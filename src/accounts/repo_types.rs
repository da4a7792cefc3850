use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account record as held by the store.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String, // argon2 PHC string, never exposed
    pub balance: Decimal,
    pub is_admin: bool,
    pub joined_at: OffsetDateTime,
    pub last_login_at: Option<OffsetDateTime>,
    pub history: Vec<PurchaseRecord>,
    pub tickets: Vec<SupportTicket>,
}

/// One completed purchase. `service_name` is a snapshot of the product name.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRecord {
    pub service_name: String,
    pub amount: Decimal,
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupportTicket {
    pub subject: String,
    pub message: String,
    pub timestamp: OffsetDateTime,
}

/// Result of the guarded balance decrement used by the purchase flow.
#[derive(Debug, Clone, PartialEq)]
pub enum DebitOutcome {
    Committed { balance: Decimal },
    InsufficientFunds { balance: Decimal },
    AccountMissing,
}

/// Result of an admin top-up.
#[derive(Debug, Clone, PartialEq)]
pub enum CreditOutcome {
    Credited { balance: Decimal },
    /// The new balance would not fit the stored `NUMERIC(14,2)` column.
    LimitExceeded { balance: Decimal },
    AccountMissing,
}

/// Largest balance an account can hold: 999 999 999 999.99.
pub fn max_balance() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}
