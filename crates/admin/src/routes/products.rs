//! Product management.
//!
//! The list is 0-based like the backend's product search. Create and update
//! are multipart forms carrying product and description images.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopbag_backend::types::{Product, ProductSearch, SearchScope, SortDir};
use shopbag_backend::{BackendError, ProductUpload};
use shopbag_core::catalog::{Category, leaves};
use shopbag_core::pagination::Pager;
use shopbag_core::types::ProductId;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{Flash, PagerView};
use crate::services::uploads::UploadForm;
use crate::services::{AdminPage, AdminSession};
use crate::state::AppState;

const PAGE_SIZE: u32 = 10;

/// Columns the product list can be sorted by.
const SORT_FIELDS: [(&str, &str); 4] = [
    ("createdAt", "Created"),
    ("productName", "Name"),
    ("price", "Price"),
    ("stock", "Stock"),
];

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    /// 0-based.
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub scope: SearchScope,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub dir: SortDir,
}

impl ProductListQuery {
    fn sort_field(&self) -> &str {
        SORT_FIELDS
            .iter()
            .find(|(field, _)| *field == self.sort)
            .map_or(SORT_FIELDS[0].0, |(field, _)| field)
    }

    fn search(&self) -> ProductSearch {
        let keyword = self.keyword.trim();
        ProductSearch {
            scope: self.scope,
            keyword: (!keyword.is_empty()).then(|| keyword.to_string()),
            page: self.page,
            size: PAGE_SIZE,
            sort_field: self.sort_field().to_string(),
            sort_dir: self.dir,
        }
    }

    /// Query string that keeps the filters across pager links.
    fn pager_query(&self) -> String {
        format!(
            "scope={}&keyword={}&sort={}&dir={}&",
            scope_param(self.scope),
            urlencoding::encode(self.keyword.trim()),
            self.sort_field(),
            self.dir.as_str(),
        )
    }
}

const fn scope_param(scope: SearchScope) -> &'static str {
    match scope {
        SearchScope::ProductName => "productName",
        SearchScope::CategoryName => "categoryName",
    }
}

/// A sortable column header.
pub struct SortLink {
    pub label: &'static str,
    pub href: String,
    pub arrow: &'static str,
}

fn sort_links(query: &ProductListQuery) -> Vec<SortLink> {
    let current = query.sort_field();
    SORT_FIELDS
        .iter()
        .map(|(field, label)| {
            let active = *field == current;
            let dir = if active { query.dir.flipped() } else { SortDir::Desc };
            SortLink {
                label,
                href: format!(
                    "?scope={}&keyword={}&sort={field}&dir={}",
                    scope_param(query.scope),
                    urlencoding::encode(query.keyword.trim()),
                    dir.as_str(),
                ),
                arrow: match (active, query.dir) {
                    (false, _) => "",
                    (true, SortDir::Asc) => "▲",
                    (true, SortDir::Desc) => "▼",
                },
            }
        })
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductListTemplate {
    pub page: AdminPage,
    pub products: Vec<Product>,
    pub pager: PagerView,
    pub keyword: String,
    pub by_category: bool,
    pub sort_links: Vec<SortLink>,
}

/// Values shown in the product form.
#[derive(Debug, Clone, Default)]
pub struct ProductFormView {
    pub category_name: String,
    pub name: String,
    pub info: String,
    pub manufacturer: String,
    pub price: String,
    pub stock: String,
    pub images: Vec<String>,
    pub description_images: Vec<String>,
}

impl ProductFormView {
    #[must_use]
    pub fn has_category(&self, name: &str) -> bool {
        self.category_name == name
    }

    fn from_upload(form: &UploadForm) -> Self {
        Self {
            category_name: form.text("category_name").to_string(),
            name: form.text("name").to_string(),
            info: form.text("info").to_string(),
            manufacturer: form.text("manufacturer").to_string(),
            price: form.text("price").to_string(),
            stock: form.text("stock").to_string(),
            images: Vec::new(),
            description_images: Vec::new(),
        }
    }
}

impl From<&Product> for ProductFormView {
    fn from(product: &Product) -> Self {
        Self {
            category_name: product.category_name.clone().unwrap_or_default(),
            name: product.product_name.clone(),
            info: product.info.clone().unwrap_or_default(),
            manufacturer: product.manufacturer.clone().unwrap_or_default(),
            price: product.price.amount().to_string(),
            stock: product.stock.to_string(),
            images: product.product_img_urls.clone(),
            description_images: product.product_desc_img_urls.clone(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub page: AdminPage,
    /// `None` when creating.
    pub product_id: Option<ProductId>,
    pub categories: Vec<Category>,
    pub form: ProductFormView,
    pub error: Option<String>,
}

/// Check the text fields and build the upload.
///
/// Images are only required when creating.
fn build_upload(
    form: &mut UploadForm,
    categories: &[Category],
    creating: bool,
) -> Result<ProductUpload> {
    let category_name = form.text("category_name").to_string();
    if !categories.iter().any(|c| c.name == category_name) {
        return Err(AppError::BadRequest(
            "Choose a subcategory for the product".to_string(),
        ));
    }

    let mut upload = ProductUpload {
        category_name,
        name: form.text("name").to_string(),
        info: form.text("info").to_string(),
        manufacturer: form.text("manufacturer").to_string(),
        price: form.integer("price", "Price")?,
        stock: form.integer("stock", "Stock")?,
        images: Vec::new(),
        description_images: Vec::new(),
    };
    upload
        .text()
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    upload.images = form.take_files("images");
    upload.description_images = form.take_files("description_images");
    if creating && upload.images.is_empty() {
        return Err(AppError::BadRequest(
            "Add at least one product image".to_string(),
        ));
    }
    Ok(upload)
}

async fn product_categories(state: &AppState) -> Result<Vec<Category>> {
    Ok(leaves(&state.backend().categories().await?))
}

async fn page(state: &AppState, session: &AdminSession) -> Result<AdminPage> {
    AdminPage::load(session, "/products", state.config().storefront_url.as_deref()).await
}

fn products_redirect() -> Response {
    Redirect::to("/products").into_response()
}

#[instrument(skip(state, session, _admin))]
pub async fn index(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse> {
    let result = state.backend().search_products(&query.search()).await?;

    Ok(ProductListTemplate {
        page: page(&state, &session).await?,
        pager: PagerView::new(
            &Pager::zero_based(query.page, result.total_pages),
            &query.pager_query(),
            "page",
        ),
        products: result.content,
        keyword: query.keyword.trim().to_string(),
        by_category: query.scope == SearchScope::CategoryName,
        sort_links: sort_links(&query),
    })
}

#[instrument(skip(state, session, _admin))]
pub async fn new(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<impl IntoResponse> {
    Ok(ProductFormTemplate {
        page: page(&state, &session).await?,
        product_id: None,
        categories: product_categories(&state).await?,
        form: ProductFormView::default(),
        error: None,
    })
}

#[instrument(skip(state, session, _admin, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    multipart: Multipart,
) -> Result<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let categories = product_categories(&state).await?;

    let result = match build_upload(&mut form, &categories, true) {
        Ok(upload) => {
            let credentials = session.credentials().await?;
            let result = state.backend().create_product(&credentials, &upload).await;
            session.save_credentials(&credentials).await?;
            result.map_err(AppError::from)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            session.flash(Flash::success("Product created.")).await?;
            Ok(products_redirect())
        }
        Err(e) => match form_error(e) {
            Ok(message) => Ok(ProductFormTemplate {
                page: page(&state, &session).await?,
                product_id: None,
                categories,
                form: ProductFormView::from_upload(&form),
                error: Some(message),
            }
            .into_response()),
            Err(e) => Err(e),
        },
    }
}

/// Messages worth showing next to the form. Anything else propagates.
fn form_error(error: AppError) -> Result<String> {
    match error {
        AppError::BadRequest(message) => Ok(message),
        AppError::Backend(e @ (BackendError::Rejected { .. } | BackendError::Conflict(_))) => Ok(e
            .user_message()
            .unwrap_or("The backend rejected the product.")
            .to_string()),
        other => Err(other),
    }
}

#[instrument(skip(state, session, _admin), fields(product_id = %id))]
pub async fn edit(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state.backend().product(id).await?;
    Ok(ProductFormTemplate {
        page: page(&state, &session).await?,
        product_id: Some(id),
        categories: product_categories(&state).await?,
        form: ProductFormView::from(&product),
        error: None,
    })
}

/// Update fields, add new images and delete the checked ones.
#[instrument(skip(state, session, _admin, multipart), fields(product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let categories = product_categories(&state).await?;
    let remove_images = form.all("delete_image");
    let remove_description_images = form.all("delete_description_image");

    let result = match build_upload(&mut form, &categories, false) {
        Ok(upload) => {
            let credentials = session.credentials().await?;
            let backend = state.backend();
            let result = async {
                backend
                    .delete_product_images(&credentials, id, &remove_images)
                    .await?;
                backend
                    .delete_product_description_images(&credentials, id, &remove_description_images)
                    .await?;
                backend.update_product(&credentials, id, &upload).await
            }
            .await;
            session.save_credentials(&credentials).await?;
            result.map_err(AppError::from)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            session.flash(Flash::success("Product updated.")).await?;
            Ok(products_redirect())
        }
        Err(e) => {
            let message = form_error(e)?;
            let mut view = ProductFormView::from_upload(&form);
            if let Ok(product) = state.backend().product(id).await {
                view.images = product.product_img_urls;
                view.description_images = product.product_desc_img_urls;
            }
            Ok(ProductFormTemplate {
                page: page(&state, &session).await?,
                product_id: Some(id),
                categories,
                form: view,
                error: Some(message),
            }
            .into_response())
        }
    }
}

#[instrument(skip(state, session, _admin), fields(product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let credentials = session.credentials().await?;
    let result = state.backend().delete_product(&credentials, id).await;
    session.save_credentials(&credentials).await?;
    result?;

    session.flash(Flash::success("Product deleted.")).await?;
    Ok(products_redirect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopbag_backend::FilePart;
    use shopbag_core::types::CategoryId;

    use super::*;

    fn category(id: i64, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            parent_id: Some(CategoryId::new(1)),
            display_order: 1,
            main_display_order: None,
            image_url: None,
        }
    }

    fn filled_form() -> UploadForm {
        let mut form = UploadForm::default();
        form.push_text("category_name", "Socks");
        form.push_text("name", "Wool socks");
        form.push_text("info", "Warm");
        form.push_text("manufacturer", "Acme");
        form.push_text("price", "9,900");
        form.push_text("stock", "12");
        form
    }

    fn image() -> FilePart {
        FilePart {
            file_name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_create_requires_an_image() {
        let mut form = filled_form();
        let err = build_upload(&mut form, &[category(2, "Socks")], true).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m.contains("image")));
    }

    #[test]
    fn test_update_without_new_images_is_fine() {
        let mut form = filled_form();
        let upload = build_upload(&mut form, &[category(2, "Socks")], false).unwrap();
        assert_eq!(upload.price, 9_900);
        assert!(upload.images.is_empty());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut form = filled_form();
        form.push_file("images", image());
        let err = build_upload(&mut form, &[category(2, "Hats")], true).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_negative_stock_rejected() {
        let mut form = UploadForm::default();
        form.push_text("category_name", "Socks");
        form.push_text("name", "Wool socks");
        form.push_text("price", "100");
        form.push_text("stock", "-1");
        let err = build_upload(&mut form, &[category(2, "Socks")], false).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m.contains("stock")));
    }

    #[test]
    fn test_unknown_sort_field_falls_back_to_created() {
        let query = ProductListQuery {
            sort: "password".to_string(),
            ..ProductListQuery::default()
        };
        assert_eq!(query.search().sort_field, "createdAt");
        assert!(query.search().keyword.is_none());
    }

    #[test]
    fn test_active_sort_link_flips_direction() {
        let query = ProductListQuery {
            sort: "price".to_string(),
            dir: SortDir::Asc,
            keyword: "sock".to_string(),
            ..ProductListQuery::default()
        };
        let links = sort_links(&query);
        let price = links.iter().find(|l| l.label == "Price").unwrap();
        assert!(price.href.contains("sort=price&dir=desc"));
        assert_eq!(price.arrow, "▲");
        assert!(query.pager_query().starts_with("scope=productName&keyword=sock&"));
    }
}
