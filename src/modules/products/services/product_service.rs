use std::sync::Arc;

use tracing::debug;

use crate::core::{AppError, Result};
use crate::modules::products::models::{
    ListProductsQuery, PageRequest, Pagination, Product, ProductPage, MAX_SEARCH_RESULTS,
};
use crate::modules::products::repositories::ProductRepository;
use crate::modules::products::services::ProductCache;

/// Catalog browsing
pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
    cache: Option<Arc<dyn ProductCache>>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        Self { repo, cache: None }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ProductCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn list(&self, query: ListProductsQuery) -> Result<ProductPage> {
        let page = PageRequest::from(query);

        let total = self.repo.count().await?;
        let products = self.repo.list(page.per_page, page.offset()).await?;

        Ok(ProductPage {
            products,
            pagination: Pagination {
                page: page.page,
                per_page: page.per_page,
                total,
            },
        })
    }

    pub async fn get(&self, id: i64) -> Result<Product> {
        if let Some(cache) = &self.cache {
            if let Some(product) = cache.get(id).await {
                debug!(product_id = id, "Product cache hit");
                return Ok(product);
            }
        }

        let product = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))?;

        if let Some(cache) = &self.cache {
            cache.put(&product).await;
        }

        Ok(product)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Product>> {
        let term = query.trim();
        if term.is_empty() {
            return Err(AppError::validation("Search query 'q' is required"));
        }

        self.repo.search(term, MAX_SEARCH_RESULTS).await
    }
}
