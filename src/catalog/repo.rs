use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{NewProduct, Product};
use crate::error::RepoError;

#[async_trait]
pub trait ProductRepo: Send + Sync {
    /// Full catalog in insertion order.
    async fn list_products(&self) -> Result<Vec<Product>, RepoError>;

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, RepoError>;

    /// Inserts `products` only if the catalog is empty, as one atomic step.
    /// Returns how many were inserted.
    async fn seed_if_empty(&self, products: Vec<NewProduct>) -> Result<usize, RepoError>;
}
