//! Public catalog: products, categories and banners.

use std::sync::Arc;

use shopbag_core::catalog::{Banner, Category};
use shopbag_core::types::{CategoryId, ProductId};
use tracing::{debug, instrument};

use crate::BackendClient;
use crate::cache::{CacheKey, CacheValue};
use crate::error::BackendError;
use crate::types::{Product, ProductPage, ProductSearch};

impl BackendClient {
    /// Fetch one product. Never cached.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown products.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, BackendError> {
        let url = self.endpoint(&format!("/api/products/{id}"))?;
        let body = self.send(self.http().get(url)).await?;
        Self::parse(&body, "product")
    }

    /// Search products by name or by category name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        search: &ProductSearch,
    ) -> Result<ProductPage, BackendError> {
        let mut url = self.endpoint(search.scope.path())?;
        url.query_pairs_mut()
            .append_pair("page", &search.page.to_string())
            .append_pair("size", &search.size.to_string())
            .append_pair("sortField", &search.sort_field)
            .append_pair("sortDir", search.sort_dir.as_str())
            .append_pair("keyword", search.keyword.as_deref().unwrap_or(""));
        let body = self.send(self.http().get(url)).await?;
        Self::parse(&body, "product page")
    }

    /// All categories, cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache().get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint("/api/categories")?;
        let body = self.send(self.http().get(url)).await?;
        let categories: Arc<Vec<Category>> = Arc::new(Self::parse(&body, "categories")?);

        self.cache()
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;

        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown categories.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn category(&self, id: CategoryId) -> Result<Category, BackendError> {
        let url = self.endpoint(&format!("/api/categories/{id}"))?;
        let body = self.send(self.http().get(url)).await?;
        Self::parse(&body, "category")
    }

    /// All banners, cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn banners(&self) -> Result<Arc<Vec<Banner>>, BackendError> {
        if let Some(CacheValue::Banners(banners)) = self.cache().get(&CacheKey::Banners).await {
            debug!("Cache hit for banners");
            return Ok(banners);
        }

        let url = self.endpoint("/api/banners")?;
        let body = self.send(self.http().get(url)).await?;
        let banners: Arc<Vec<Banner>> = Arc::new(Self::parse(&body, "banners")?);

        self.cache()
            .insert(CacheKey::Banners, CacheValue::Banners(Arc::clone(&banners)))
            .await;

        Ok(banners)
    }

    /// Drop cached catalog lists after an admin change.
    pub async fn invalidate_catalog(&self, key: CacheKey) {
        self.cache().invalidate(&key).await;
    }
}
