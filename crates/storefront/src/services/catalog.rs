//! The product catalog with an in-memory cache.
//!
//! The service has no server-side filtering, so the full listing is fetched
//! once, cached via `moka`, and filtered locally. Admin writes go through
//! here so they can drop the cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use pantry_core::product::{categories, featured};
use pantry_core::{CatalogQuery, Product, ProductDraft, ProductId};
use tracing::{debug, info, instrument};

use crate::api::ApiClient;
use crate::error::{ApiError, add_breadcrumb};
use crate::session::AuthToken;

/// Cache key for products.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
}

/// Cached catalog reads and cache-invalidating admin writes.
#[derive(Clone)]
pub struct Catalog {
    api: ApiClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("api", &self.api)
            .field("cached_entries", &self.cache.entry_count())
            .finish()
    }
}

impl Catalog {
    /// A catalog whose cached entries live for `ttl`.
    #[must_use]
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();
        Self { api, cache }
    }

    /// Products matching `query`, in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    #[instrument(skip(self, token))]
    pub async fn products(
        &self,
        token: Option<&AuthToken>,
        query: &CatalogQuery,
    ) -> Result<Vec<Product>, ApiError> {
        let all = self.all_products(token).await?;
        if query.is_unfiltered() {
            return Ok(all.as_ref().clone());
        }
        Ok(query.apply(&all))
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn product(
        &self,
        token: Option<&AuthToken>,
        id: &ProductId,
    ) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self.api.get_product(token, id).await?;
        self.cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// The landing-page selection: the first few products in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    pub async fn featured(&self, token: Option<&AuthToken>) -> Result<Vec<Product>, ApiError> {
        let all = self.all_products(token).await?;
        Ok(featured(&all).to_vec())
    }

    /// Distinct categories, lower-cased and sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    pub async fn categories(&self, token: Option<&AuthToken>) -> Result<Vec<String>, ApiError> {
        let all = self.all_products(token).await?;
        Ok(categories(&all))
    }

    // =========================================================================
    // Admin writes
    // =========================================================================

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an incomplete draft, otherwise any
    /// request failure.
    #[instrument(skip(self, token, draft))]
    pub async fn create_product(
        &self,
        token: &AuthToken,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        let product = self.api.create_product(token, draft).await?;
        self.invalidate_all();
        add_breadcrumb("admin", "Product created", Some(&[("product_id", product.id.as_str())]));
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an incomplete draft, otherwise any
    /// request failure.
    #[instrument(skip(self, token, draft), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &AuthToken,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        let product = self.api.update_product(token, id, draft).await?;
        self.invalidate_all();
        add_breadcrumb("admin", "Product updated", Some(&[("product_id", id.as_str())]));
        info!("Product updated");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &AuthToken, id: &ProductId) -> Result<(), ApiError> {
        self.api.delete_product(token, id).await?;
        self.invalidate_all();
        add_breadcrumb("admin", "Product deleted", Some(&[("product_id", id.as_str())]));
        info!("Product deleted");
        Ok(())
    }

    /// Drop every cached response.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    async fn all_products(&self, token: Option<&AuthToken>) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = Arc::new(self.api.list_products(token).await?);
        self.cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }
}
