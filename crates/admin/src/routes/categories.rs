//! Category management.
//!
//! Two list views: the tree (parents and the children of one parent, five
//! per page each) and the home page order (every category by main display
//! order, ten per page).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopbag_backend::{BackendError, CategoryUpload};
use shopbag_core::catalog::{
    Category, by_main_display_order, children, ensure_deletable, parents, parse_main_display_order,
    validate_display_order,
};
use shopbag_core::pagination::{Pager, paginate, total_pages};
use shopbag_core::types::CategoryId;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{Flash, PagerView};
use crate::services::uploads::UploadForm;
use crate::services::{AdminPage, AdminSession};
use crate::state::AppState;

const TREE_PAGE_SIZE: usize = 5;
const ORDER_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryView {
    #[default]
    Tree,
    Order,
}

#[derive(Debug, Deserialize)]
pub struct CategoryListQuery {
    #[serde(default)]
    pub view: CategoryView,
    #[serde(default)]
    pub parent: Option<CategoryId>,
    #[serde(default = "first_page")]
    pub parent_page: u32,
    #[serde(default = "first_page")]
    pub child_page: u32,
    #[serde(default = "first_page")]
    pub page: u32,
}

const fn first_page() -> u32 {
    1
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/tree.html")]
pub struct CategoryTreeTemplate {
    pub page: AdminPage,
    pub parents: Vec<Category>,
    pub parent_pager: PagerView,
    pub selected: Option<Category>,
    pub children: Vec<Category>,
    pub child_pager: PagerView,
}

impl CategoryTreeTemplate {
    fn is_selected(&self, id: impl std::borrow::Borrow<CategoryId>) -> bool {
        self.selected.as_ref().is_some_and(|c| c.id == *id.borrow())
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/order.html")]
pub struct CategoryOrderTemplate {
    pub page: AdminPage,
    pub categories: Vec<Category>,
    pub pager: PagerView,
}

/// Values shown in the category form.
#[derive(Debug, Clone, Default)]
pub struct CategoryFormView {
    pub name: String,
    pub display_order: String,
    pub main_display_order: String,
    pub parent_id: Option<CategoryId>,
    pub image_url: Option<String>,
}

impl CategoryFormView {
    #[must_use]
    pub fn has_parent(&self, id: impl std::borrow::Borrow<CategoryId>) -> bool {
        self.parent_id == Some(*id.borrow())
    }

    fn from_upload(form: &UploadForm) -> Self {
        Self {
            name: form.text("name").to_string(),
            display_order: form.text("display_order").to_string(),
            main_display_order: form.text("main_display_order").to_string(),
            parent_id: form.text("parent_id").parse().ok(),
            image_url: None,
        }
    }
}

impl From<&Category> for CategoryFormView {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            display_order: category.display_order.to_string(),
            main_display_order: category
                .main_display_order
                .map(|o| o.to_string())
                .unwrap_or_default(),
            parent_id: category.parent_id,
            image_url: category.image_url.clone(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub page: AdminPage,
    pub category_id: Option<CategoryId>,
    /// Possible parents. Excludes the category being edited.
    pub parents: Vec<Category>,
    pub form: CategoryFormView,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewCategoryQuery {
    #[serde(default)]
    pub parent: Option<CategoryId>,
}

fn build_upload(form: &mut UploadForm, parent_choices: &[Category]) -> Result<CategoryUpload> {
    let bad_request = |e: shopbag_core::catalog::CatalogError| AppError::BadRequest(e.to_string());

    let name = form.text("name").to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Category name is required".to_string()));
    }
    let display_order = form.integer("display_order", "Display order")?;
    let display_order =
        validate_display_order("display order", display_order).map_err(bad_request)?;
    let main_display_order =
        parse_main_display_order(form.text("main_display_order")).map_err(bad_request)?;

    let parent_id = match form.text("parent_id") {
        "" => None,
        raw => {
            let id: CategoryId = raw
                .parse()
                .map_err(|_| AppError::BadRequest("Unknown parent category".to_string()))?;
            if !parent_choices.iter().any(|c| c.id == id) {
                return Err(AppError::BadRequest("Unknown parent category".to_string()));
            }
            Some(id)
        }
    };

    Ok(CategoryUpload {
        name,
        display_order,
        main_display_order,
        parent_id,
        image: form.take_file("image"),
    })
}

/// Parent options for a form. A category never becomes its own parent.
fn parent_choices(categories: &[Category], editing: Option<CategoryId>) -> Vec<Category> {
    parents(categories)
        .into_iter()
        .filter(|c| Some(c.id) != editing)
        .collect()
}

fn find(categories: &[Category], id: CategoryId) -> Result<Category> {
    categories
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))
}

async fn page(state: &AppState, session: &AdminSession) -> Result<AdminPage> {
    AdminPage::load(session, "/categories", state.config().storefront_url.as_deref()).await
}

fn categories_redirect() -> Response {
    Redirect::to("/categories").into_response()
}

/// Form-level failures; everything else propagates.
fn form_error(error: AppError) -> Result<String> {
    match error {
        AppError::BadRequest(message) => Ok(message),
        AppError::Backend(e @ (BackendError::Rejected { .. } | BackendError::Conflict(_))) => Ok(e
            .user_message()
            .unwrap_or("The backend rejected the category.")
            .to_string()),
        other => Err(other),
    }
}

/// One page of parents and one page of the selected parent's children.
struct TreePage {
    parents: Vec<Category>,
    parent_pager: Pager,
    selected: Option<Category>,
    children: Vec<Category>,
    child_pager: Pager,
}

fn tree_view(categories: &[Category], query: &CategoryListQuery) -> TreePage {
    let all_parents = parents(categories);
    let parent_total = total_pages(all_parents.len(), TREE_PAGE_SIZE);
    let parent_page = query.parent_page.clamp(1, parent_total);
    let shown_parents = paginate(&all_parents, parent_page, TREE_PAGE_SIZE).to_vec();

    let selected = query
        .parent
        .and_then(|id| all_parents.iter().find(|c| c.id == id))
        .or_else(|| shown_parents.first())
        .cloned();
    let all_children = selected
        .as_ref()
        .map(|parent| children(categories, parent.id))
        .unwrap_or_default();
    let child_total = total_pages(all_children.len(), TREE_PAGE_SIZE);
    let child_page = query.child_page.clamp(1, child_total);
    let shown_children = paginate(&all_children, child_page, TREE_PAGE_SIZE).to_vec();

    TreePage {
        parents: shown_parents,
        parent_pager: Pager::one_based(parent_page, parent_total),
        selected,
        children: shown_children,
        child_pager: Pager::one_based(child_page, child_total),
    }
}

#[instrument(skip(state, session, _admin))]
pub async fn index(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<CategoryListQuery>,
) -> Result<Response> {
    let categories = state.backend().categories().await?;

    if query.view == CategoryView::Order {
        let ordered = by_main_display_order(&categories);
        let total = total_pages(ordered.len(), ORDER_PAGE_SIZE);
        let current = query.page.clamp(1, total);
        return Ok(CategoryOrderTemplate {
            page: page(&state, &session).await?,
            categories: paginate(&ordered, current, ORDER_PAGE_SIZE).to_vec(),
            pager: PagerView::new(&Pager::one_based(current, total), "view=order&", "page"),
        }
        .into_response());
    }

    let tree = tree_view(&categories, &query);
    let parent_query = tree
        .selected
        .as_ref()
        .map_or_else(String::new, |p| format!("parent={}&", p.id));
    let child_query = format!("{parent_query}parent_page={}&", query.parent_page.max(1));

    Ok(CategoryTreeTemplate {
        page: page(&state, &session).await?,
        parent_pager: PagerView::new(&tree.parent_pager, "", "parent_page"),
        child_pager: PagerView::new(&tree.child_pager, &child_query, "child_page"),
        parents: tree.parents,
        selected: tree.selected,
        children: tree.children,
    }
    .into_response())
}

#[instrument(skip(state, session, _admin))]
pub async fn new(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<NewCategoryQuery>,
) -> Result<impl IntoResponse> {
    let categories = state.backend().categories().await?;
    Ok(CategoryFormTemplate {
        page: page(&state, &session).await?,
        category_id: None,
        parents: parent_choices(&categories, None),
        form: CategoryFormView {
            parent_id: query.parent,
            ..CategoryFormView::default()
        },
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
    let categories = state.backend().categories().await?;
    let choices = parent_choices(&categories, None);

    let result = match build_upload(&mut form, &choices) {
        Ok(upload) => {
            let credentials = session.credentials().await?;
            let result = state.backend().create_category(&credentials, &upload).await;
            session.save_credentials(&credentials).await?;
            result.map_err(AppError::from)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            session.flash(Flash::success("Category created.")).await?;
            Ok(categories_redirect())
        }
        Err(e) => Ok(CategoryFormTemplate {
            error: Some(form_error(e)?),
            page: page(&state, &session).await?,
            category_id: None,
            parents: choices,
            form: CategoryFormView::from_upload(&form),
        }
        .into_response()),
    }
}

#[instrument(skip(state, session, _admin), fields(category_id = %id))]
pub async fn edit(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
) -> Result<impl IntoResponse> {
    let categories = state.backend().categories().await?;
    let category = find(&categories, id)?;
    Ok(CategoryFormTemplate {
        page: page(&state, &session).await?,
        category_id: Some(id),
        parents: parent_choices(&categories, Some(id)),
        form: CategoryFormView::from(&category),
        error: None,
    })
}

/// Update a category. A new image replaces the old one; without one the
/// current image stays.
#[instrument(skip(state, session, _admin, multipart), fields(category_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
    multipart: Multipart,
) -> Result<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let categories = state.backend().categories().await?;
    let current = find(&categories, id)?;
    let choices = parent_choices(&categories, Some(id));

    let result = match build_upload(&mut form, &choices) {
        Ok(upload) => {
            let credentials = session.credentials().await?;
            let result = state.backend().update_category(&credentials, id, &upload).await;
            session.save_credentials(&credentials).await?;
            result.map_err(AppError::from)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            session.flash(Flash::success("Category updated.")).await?;
            Ok(categories_redirect())
        }
        Err(e) => Ok(CategoryFormTemplate {
            error: Some(form_error(e)?),
            page: page(&state, &session).await?,
            category_id: Some(id),
            parents: choices,
            form: CategoryFormView {
                image_url: current.image_url,
                ..CategoryFormView::from_upload(&form)
            },
        }
        .into_response()),
    }
}

/// Delete a category unless other categories hang under it.
#[instrument(skip(state, session, _admin), fields(category_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let categories = state.backend().categories().await?;
    if ensure_deletable(&categories, id).is_err() {
        session
            .flash(Flash::error(
                "Delete or move its subcategories before deleting this category.",
            ))
            .await?;
        return Ok(categories_redirect());
    }

    let credentials = session.credentials().await?;
    let result = state.backend().delete_category(&credentials, id).await;
    session.save_credentials(&credentials).await?;

    let flash = match result {
        Ok(()) => Flash::success("Category deleted."),
        Err(e @ (BackendError::Rejected { .. } | BackendError::Conflict(_))) => Flash::error(
            e.user_message()
                .unwrap_or("The category is still in use.")
                .to_string(),
        ),
        Err(e) => return Err(e.into()),
    };
    session.flash(flash).await?;
    Ok(categories_redirect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: i64, parent: Option<i64>, order: i64) -> Category {
        Category {
            id: CategoryId::new(id),
            name: format!("c{id}"),
            parent_id: parent.map(CategoryId::new),
            display_order: order,
            main_display_order: None,
            image_url: None,
        }
    }

    fn catalog() -> Vec<Category> {
        let mut out: Vec<Category> = (1..=7).map(|id| category(id, None, id)).collect();
        out.extend((10..=16).map(|id| category(id, Some(2), id)));
        out
    }

    fn query(parent: Option<i64>, parent_page: u32, child_page: u32) -> CategoryListQuery {
        CategoryListQuery {
            view: CategoryView::Tree,
            parent: parent.map(CategoryId::new),
            parent_page,
            child_page,
            page: 1,
        }
    }

    #[test]
    fn test_tree_defaults_to_first_parent_on_page() {
        let tree = tree_view(&catalog(), &query(None, 2, 1));
        assert_eq!(tree.parents.len(), 2);
        assert_eq!(tree.parent_pager.links.len(), 2);
        assert_eq!(tree.selected.unwrap().id, CategoryId::new(6));
        assert!(tree.children.is_empty());
    }

    #[test]
    fn test_tree_pages_children_of_selected_parent() {
        let tree = tree_view(&catalog(), &query(Some(2), 1, 2));
        assert_eq!(tree.selected.unwrap().id, CategoryId::new(2));
        let ids: Vec<i64> = tree.children.iter().map(|c| c.id.as_i64()).collect();
        assert_eq!(ids, vec![15, 16]);
        assert_eq!(tree.child_pager.prev, Some(1));
    }

    #[test]
    fn test_parent_choices_exclude_self_and_children() {
        let choices = parent_choices(&catalog(), Some(CategoryId::new(2)));
        assert_eq!(choices.len(), 6);
        assert!(choices.iter().all(|c| c.is_parent() && c.id != CategoryId::new(2)));
    }

    #[test]
    fn test_upload_validates_orders_and_parent() {
        let choices = parent_choices(&catalog(), None);

        let mut form = UploadForm::default();
        form.push_text("name", "Socks");
        form.push_text("display_order", "0");
        assert!(matches!(
            build_upload(&mut form, &choices),
            Err(AppError::BadRequest(m)) if m.contains("display order")
        ));

        let mut form = UploadForm::default();
        form.push_text("name", "Socks");
        form.push_text("display_order", "3");
        form.push_text("main_display_order", "");
        form.push_text("parent_id", "2");
        let upload = build_upload(&mut form, &choices).unwrap();
        assert_eq!(upload.parent_id, Some(CategoryId::new(2)));
        assert!(upload.main_display_order.is_none());
        assert!(upload.image.is_none());

        let mut form = UploadForm::default();
        form.push_text("name", "Socks");
        form.push_text("display_order", "3");
        form.push_text("parent_id", "12");
        assert!(build_upload(&mut form, &choices).is_err());
    }
}
