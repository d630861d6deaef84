//! Admin catalog management.
//!
//! Create and update calls are multipart: text fields plus uploaded images.
//! Forms are rebuilt from [`FilePart`]s on every attempt so the request can be
//! replayed after a token refresh.

use reqwest::multipart::{Form, Part};
use shopbag_core::catalog::ProductText;
use shopbag_core::types::{BannerId, CategoryId, ProductId};
use tracing::instrument;

use crate::BackendClient;
use crate::auth::Credentials;
use crate::cache::CacheKey;
use crate::error::BackendError;

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    fn part(&self) -> Result<Part, BackendError> {
        Ok(Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)?)
    }
}

/// Fields of a product create or update form.
#[derive(Debug, Clone)]
pub struct ProductUpload {
    pub category_name: String,
    pub name: String,
    pub info: String,
    pub manufacturer: String,
    pub price: i64,
    pub stock: i64,
    pub images: Vec<FilePart>,
    pub description_images: Vec<FilePart>,
}

impl ProductUpload {
    /// The text fields, for validation.
    #[must_use]
    pub fn text(&self) -> ProductText<'_> {
        ProductText {
            name: &self.name,
            info: &self.info,
            manufacturer: &self.manufacturer,
            price: self.price,
            stock: self.stock,
        }
    }

    fn form(&self) -> Result<Form, BackendError> {
        let mut form = Form::new()
            .text("categoryName", self.category_name.clone())
            .text("productName", self.name.clone())
            .text("price", self.price.to_string())
            .text("info", self.info.clone())
            .text("manufacturer", self.manufacturer.clone())
            .text("stock", self.stock.to_string());
        for image in &self.images {
            form = form.part("productImgUrls", image.part()?);
        }
        for image in &self.description_images {
            form = form.part("productDescImgUrls", image.part()?);
        }
        Ok(form)
    }
}

/// Fields of a category create or update form.
#[derive(Debug, Clone)]
pub struct CategoryUpload {
    pub name: String,
    pub display_order: i64,
    pub main_display_order: Option<i64>,
    pub parent_id: Option<CategoryId>,
    pub image: Option<FilePart>,
}

impl CategoryUpload {
    fn form(&self) -> Result<Form, BackendError> {
        let mut form = Form::new()
            .text("name", self.name.clone())
            .text("displayOrder", self.display_order.to_string());
        if let Some(order) = self.main_display_order {
            form = form.text("mainDisplayOrder", order.to_string());
        }
        if let Some(parent) = self.parent_id {
            form = form.text("parentId", parent.to_string());
        }
        if let Some(image) = &self.image {
            form = form.part("imageFile", image.part()?);
        }
        Ok(form)
    }
}

/// Fields of a banner create or update form.
#[derive(Debug, Clone)]
pub struct BannerUpload {
    pub title: String,
    pub display_order: i64,
    pub target_url: Option<String>,
    pub image: Option<FilePart>,
}

impl BannerUpload {
    fn form(&self) -> Result<Form, BackendError> {
        let mut form = Form::new()
            .text("title", self.title.clone())
            .text("displayOrder", self.display_order.to_string());
        if let Some(url) = self.target_url.as_deref().filter(|u| !u.trim().is_empty()) {
            form = form.text("targetUrl", url.trim().to_string());
        }
        if let Some(image) = &self.image {
            form = form.part("image", image.part()?);
        }
        Ok(form)
    }
}

impl BackendClient {
    /// # Errors
    ///
    /// Returns `Rejected` with the backend's message on validation failures.
    #[instrument(skip(self, credentials, upload), fields(name = %upload.name))]
    pub async fn create_product(
        &self,
        credentials: &Credentials,
        upload: &ProductUpload,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("/api/admin/products")?;
        self.send_authorized(credentials, |http| {
            Ok(http.post(url.clone()).multipart(upload.form()?))
        })
        .await?;
        tracing::info!("Product created");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown products.
    #[instrument(skip(self, credentials, upload), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        credentials: &Credentials,
        id: ProductId,
        upload: &ProductUpload,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/admin/products/{id}"))?;
        self.send_authorized(credentials, |http| {
            Ok(http.put(url.clone()).multipart(upload.form()?))
        })
        .await?;
        tracing::info!("Product updated");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown products.
    #[instrument(skip(self, credentials), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        credentials: &Credentials,
        id: ProductId,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/admin/products/{id}"))?;
        self.send_authorized(credentials, |http| Ok(http.delete(url.clone())))
            .await?;
        tracing::info!("Product deleted");
        Ok(())
    }

    /// Remove main images from a product. No call is made for an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials, urls), fields(product_id = %id, count = urls.len()))]
    pub async fn delete_product_images(
        &self,
        credentials: &Credentials,
        id: ProductId,
        urls: &[String],
    ) -> Result<(), BackendError> {
        self.delete_image_urls(
            credentials,
            &format!("/api/admin/products/{id}/images"),
            "imageUrlsToDelete",
            urls,
        )
        .await
    }

    /// Remove description images from a product. No call is made for an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials, urls), fields(product_id = %id, count = urls.len()))]
    pub async fn delete_product_description_images(
        &self,
        credentials: &Credentials,
        id: ProductId,
        urls: &[String],
    ) -> Result<(), BackendError> {
        self.delete_image_urls(
            credentials,
            &format!("/api/admin/products/{id}/description-images"),
            "descImageUrlsToDelete",
            urls,
        )
        .await
    }

    async fn delete_image_urls(
        &self,
        credentials: &Credentials,
        path: &str,
        param: &str,
        urls: &[String],
    ) -> Result<(), BackendError> {
        if urls.is_empty() {
            return Ok(());
        }
        let mut url = self.endpoint(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for image in urls {
                pairs.append_pair(param, image);
            }
        }
        self.send_authorized(credentials, |http| Ok(http.delete(url.clone())))
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Rejected` with the backend's message on validation failures.
    #[instrument(skip(self, credentials, upload), fields(name = %upload.name))]
    pub async fn create_category(
        &self,
        credentials: &Credentials,
        upload: &CategoryUpload,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("/api/admin/categories")?;
        self.send_authorized(credentials, |http| {
            Ok(http.post(url.clone()).multipart(upload.form()?))
        })
        .await?;
        self.invalidate_catalog(CacheKey::Categories).await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown categories.
    #[instrument(skip(self, credentials, upload), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        credentials: &Credentials,
        id: CategoryId,
        upload: &CategoryUpload,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/admin/categories/{id}"))?;
        self.send_authorized(credentials, |http| {
            Ok(http.put(url.clone()).multipart(upload.form()?))
        })
        .await?;
        self.invalidate_catalog(CacheKey::Categories).await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Rejected` when the backend refuses (e.g. products still use it).
    #[instrument(skip(self, credentials), fields(category_id = %id))]
    pub async fn delete_category(
        &self,
        credentials: &Credentials,
        id: CategoryId,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/admin/categories/{id}"))?;
        self.send_authorized(credentials, |http| Ok(http.delete(url.clone())))
            .await?;
        self.invalidate_catalog(CacheKey::Categories).await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Rejected` with the backend's message on validation failures.
    #[instrument(skip(self, credentials, upload), fields(title = %upload.title))]
    pub async fn create_banner(
        &self,
        credentials: &Credentials,
        upload: &BannerUpload,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("/api/admin/banners")?;
        self.send_authorized(credentials, |http| {
            Ok(http.post(url.clone()).multipart(upload.form()?))
        })
        .await?;
        self.invalidate_catalog(CacheKey::Banners).await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown banners.
    #[instrument(skip(self, credentials, upload), fields(banner_id = %id))]
    pub async fn update_banner(
        &self,
        credentials: &Credentials,
        id: BannerId,
        upload: &BannerUpload,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/admin/banners/{id}"))?;
        self.send_authorized(credentials, |http| {
            Ok(http.put(url.clone()).multipart(upload.form()?))
        })
        .await?;
        self.invalidate_catalog(CacheKey::Banners).await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown banners.
    #[instrument(skip(self, credentials), fields(banner_id = %id))]
    pub async fn delete_banner(
        &self,
        credentials: &Credentials,
        id: BannerId,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/admin/banners/{id}"))?;
        self.send_authorized(credentials, |http| Ok(http.delete(url.clone())))
            .await?;
        self.invalidate_catalog(CacheKey::Banners).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png() -> FilePart {
        FilePart {
            file_name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50],
        }
    }

    #[test]
    fn test_bad_mime_is_reported() {
        let part = FilePart {
            content_type: "not a mime".to_string(),
            ..png()
        };
        assert!(matches!(part.part(), Err(BackendError::Http(_))));
    }

    #[test]
    fn test_forms_build_with_optional_fields() {
        let category = CategoryUpload {
            name: "Tea".to_string(),
            display_order: 1,
            main_display_order: Some(2),
            parent_id: Some(CategoryId::new(3)),
            image: Some(png()),
        };
        assert!(category.form().is_ok());

        let banner = BannerUpload {
            title: "Spring".to_string(),
            display_order: 1,
            target_url: Some("  ".to_string()),
            image: None,
        };
        assert!(banner.form().is_ok());
    }
}
