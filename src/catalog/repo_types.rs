use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Catalog entry as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: String,
    pub external_link: String,
}

/// Product definition before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub external_link: String,
}
