use std::sync::Arc;

use tracing::info;

use super::{
    repo::ProductRepo,
    repo_types::{NewProduct, Product},
    seed::default_products,
};
use crate::error::AppResult;

#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductRepo>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepo>) -> Self {
        Self { products }
    }

    pub async fn list(&self) -> AppResult<Vec<Product>> {
        Ok(self.products.list_products().await?)
    }

    /// Populates an empty catalog with the default product set.
    pub async fn seed(&self) -> AppResult<usize> {
        self.seed_with(default_products()).await
    }

    pub async fn seed_with(&self, products: Vec<NewProduct>) -> AppResult<usize> {
        let inserted = self.products.seed_if_empty(products).await?;
        if inserted > 0 {
            info!(inserted, "catalog seeded");
        }
        Ok(inserted)
    }
}
