use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::OffsetDateTime;
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

/// PostgreSQL-backed store for accounts and the catalog.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::warn!(error = %e, "migration failed; continuing with existing schema");
        }
        Ok(Self { pool })
    }

    async fn hydrate(&self, rows: Vec<AccountRow>) -> Result<Vec<Account>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let purchases = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT account_id, service_name, amount, purchased_at
            FROM purchases
            WHERE account_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let tickets = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT account_id, subject, message, submitted_at
            FROM support_tickets
            WHERE account_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut history: HashMap<Uuid, Vec<PurchaseRecord>> = HashMap::new();
        for p in purchases {
            history.entry(p.account_id).or_default().push(PurchaseRecord {
                service_name: p.service_name,
                amount: p.amount,
                timestamp: p.purchased_at,
            });
        }
        let mut inbox: HashMap<Uuid, Vec<SupportTicket>> = HashMap::new();
        for t in tickets {
            inbox.entry(t.account_id).or_default().push(SupportTicket {
                subject: t.subject,
                message: t.message,
                timestamp: t.submitted_at,
            });
        }

        Ok(rows
            .into_iter()
            .map(|r| {
                let history = history.remove(&r.id).unwrap_or_default();
                let tickets = inbox.remove(&r.id).unwrap_or_default();
                r.into_account(history, tickets)
            })
            .collect())
    }

    async fn hydrate_one(&self, row: Option<AccountRow>) -> Result<Option<Account>, RepoError> {
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    password_hash: String,
    balance: Decimal,
    is_admin: bool,
    joined_at: OffsetDateTime,
    last_login_at: Option<OffsetDateTime>,
}

impl AccountRow {
    fn into_account(self, history: Vec<PurchaseRecord>, tickets: Vec<SupportTicket>) -> Account {
        Account {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            balance: self.balance,
            is_admin: self.is_admin,
            joined_at: self.joined_at,
            last_login_at: self.last_login_at,
            history,
            tickets,
        }
    }
}

#[derive(Debug, FromRow)]
struct PurchaseRow {
    account_id: Uuid,
    service_name: String,
    amount: Decimal,
    purchased_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct TicketRow {
    account_id: Uuid,
    subject: String,
    message: String,
    submitted_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    description: String,
    external_link: String,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            price: r.price,
            description: r.description,
            external_link: r.external_link,
        }
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, username, password_hash, balance, is_admin, joined_at, last_login_at";

#[async_trait]
impl AccountRepo for PgStore {
    async fn create_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Account, RepoError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO accounts (id, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into_account(Vec::new(), Vec::new()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, RepoError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        self.hydrate_one(row).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.hydrate_one(row).await
    }

    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        sqlx::query("UPDATE accounts SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn credit(&self, username: &str, amount: Decimal) -> Result<CreditOutcome, RepoError> {
        let credited = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE accounts
               SET balance = balance + $2
             WHERE username = $1 AND balance + $2 <= $3
            RETURNING balance
            "#,
        )
        .bind(username)
        .bind(amount)
        .bind(max_balance())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(balance) = credited {
            return Ok(CreditOutcome::Credited { balance });
        }
        let current =
            sqlx::query_scalar::<_, Decimal>("SELECT balance FROM accounts WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(match current {
            Some(balance) => CreditOutcome::LimitExceeded { balance },
            None => CreditOutcome::AccountMissing,
        })
    }

    async fn debit_for_purchase(
        &self,
        id: Uuid,
        record: PurchaseRecord,
    ) -> Result<DebitOutcome, RepoError> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        // Guarded decrement: the row is only touched when funds suffice, and
        // the row lock serializes concurrent purchases on the same account.
        let debited = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE accounts
               SET balance = balance - $2
             WHERE id = $1 AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(id)
        .bind(record.amount)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(balance) = debited else {
            let current =
                sqlx::query_scalar::<_, Decimal>("SELECT balance FROM accounts WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await.context("rollback tx")?;
            return Ok(match current {
                Some(balance) => DebitOutcome::InsufficientFunds { balance },
                None => DebitOutcome::AccountMissing,
            });
        };

        sqlx::query(
            r#"
            INSERT INTO purchases (account_id, service_name, amount, purchased_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(&record.service_name)
        .bind(record.amount)
        .bind(record.timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.context("commit tx")?;
        Ok(DebitOutcome::Committed { balance })
    }

    async fn append_ticket(&self, id: Uuid, ticket: SupportTicket) -> Result<bool, RepoError> {
        let res = sqlx::query(
            r#"
            INSERT INTO support_tickets (account_id, subject, message, submitted_at)
            SELECT id, $2, $3, $4 FROM accounts WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&ticket.subject)
        .bind(&ticket.message)
        .bind(ticket.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, RepoError> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY joined_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }
}

#[async_trait]
impl ProductRepo for PgStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price, description, external_link
            FROM products
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price, description, external_link
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn seed_if_empty(&self, products: Vec<NewProduct>) -> Result<usize, RepoError> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        // Blocks a second instance starting at the same moment until we commit.
        sqlx::query("LOCK TABLE products IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *tx)
            .await?;
        if count > 0 {
            tx.commit().await.context("commit tx")?;
            return Ok(0);
        }

        let inserted = products.len();
        for p in products {
            sqlx::query(
                r#"
                INSERT INTO products (id, name, price, description, external_link)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&p.name)
            .bind(p.price)
            .bind(&p.description)
            .bind(&p.external_link)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(inserted)
    }
}
