//! Catalog shapes shared by the storefront and the admin console.
//!
//! Categories form a two-level tree: parents (no `parent_id`) hold the leaf
//! categories products are filed under. Parents and children are ordered by
//! `display_order`; the home page lists categories that carry a
//! `main_display_order`.

use serde::{Deserialize, Serialize};

use crate::types::{BannerId, CategoryId};

/// Banner title that advertises the welcome coupons.
pub const COUPON_AD_TITLE: &str = "쿠폰 광고";
/// Where coupon advertisement banners lead.
pub const WELCOME_COUPONS_PATH: &str = "/coupons/welcome";

pub const PRODUCT_NAME_MAX: usize = 100;
pub const PRODUCT_INFO_MAX: usize = 500;
pub const MANUFACTURER_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    pub display_order: i64,
    #[serde(default)]
    pub main_display_order: Option<i64>,
    #[serde(default, alias = "image", alias = "imgUrl")]
    pub image_url: Option<String>,
}

impl Category {
    #[must_use]
    pub const fn is_parent(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub target_url: Option<String>,
    pub display_order: i64,
}

impl Banner {
    /// Where clicking the banner leads, if anywhere.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        match self.target_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Some(url),
            _ if self.title == COUPON_AD_TITLE => Some(WELCOME_COUPONS_PATH),
            _ => None,
        }
    }
}

/// A parent category with its children, both ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub category: Category,
    pub children: Vec<Category>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be a number of at least 1")]
    OrderBelowOne { field: &'static str },
    #[error("{field} cannot be negative")]
    Negative { field: &'static str },
    #[error("category {0} still has subcategories")]
    HasChildren(CategoryId),
}

/// Top-level categories by display order.
#[must_use]
pub fn parents(categories: &[Category]) -> Vec<Category> {
    let mut out: Vec<Category> = categories
        .iter()
        .filter(|c| c.is_parent())
        .cloned()
        .collect();
    out.sort_by_key(|c| c.display_order);
    out
}

/// Children of one parent by display order.
#[must_use]
pub fn children(categories: &[Category], parent: CategoryId) -> Vec<Category> {
    let mut out: Vec<Category> = categories
        .iter()
        .filter(|c| c.parent_id == Some(parent))
        .cloned()
        .collect();
    out.sort_by_key(|c| c.display_order);
    out
}

/// Parents with their children, for navigation menus.
#[must_use]
pub fn tree(categories: &[Category]) -> Vec<CategoryNode> {
    parents(categories)
        .into_iter()
        .map(|category| CategoryNode {
            children: children(categories, category.id),
            category,
        })
        .collect()
}

/// Categories featured on the home page, by main display order.
#[must_use]
pub fn main_display(categories: &[Category]) -> Vec<Category> {
    let mut out: Vec<Category> = categories
        .iter()
        .filter(|c| c.main_display_order.is_some())
        .cloned()
        .collect();
    out.sort_by_key(|c| c.main_display_order);
    out
}

/// Every category by main display order, unfeatured ones last.
#[must_use]
pub fn by_main_display_order(categories: &[Category]) -> Vec<Category> {
    let mut out = categories.to_vec();
    out.sort_by_key(|c| (c.main_display_order.is_none(), c.main_display_order));
    out
}

/// Categories a product can be filed under.
#[must_use]
pub fn leaves(categories: &[Category]) -> Vec<Category> {
    let mut out: Vec<Category> = categories
        .iter()
        .filter(|c| !c.is_parent())
        .cloned()
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// # Errors
///
/// Returns `HasChildren` when any category names `id` as its parent.
pub fn ensure_deletable(categories: &[Category], id: CategoryId) -> Result<(), CatalogError> {
    if categories.iter().any(|c| c.parent_id == Some(id)) {
        Err(CatalogError::HasChildren(id))
    } else {
        Ok(())
    }
}

#[must_use]
pub fn sorted_banners(banners: &[Banner]) -> Vec<Banner> {
    let mut out = banners.to_vec();
    out.sort_by_key(|b| b.display_order);
    out
}

/// Check a display order entered in a form.
///
/// # Errors
///
/// Returns `OrderBelowOne` for values under 1.
pub const fn validate_display_order(field: &'static str, value: i64) -> Result<i64, CatalogError> {
    if value < 1 {
        Err(CatalogError::OrderBelowOne { field })
    } else {
        Ok(value)
    }
}

/// Parse the optional main display order: blank means "not featured".
///
/// # Errors
///
/// Returns `OrderBelowOne` for non-numeric input or values under 1.
pub fn parse_main_display_order(input: &str) -> Result<Option<i64>, CatalogError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    let field = "main display order";
    let value = input
        .parse::<i64>()
        .map_err(|_| CatalogError::OrderBelowOne { field })?;
    validate_display_order(field, value).map(Some)
}

/// Free-text product fields checked before upload.
#[derive(Debug, Clone, Copy)]
pub struct ProductText<'a> {
    pub name: &'a str,
    pub info: &'a str,
    pub manufacturer: &'a str,
    pub price: i64,
    pub stock: i64,
}

impl ProductText<'_> {
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::Required {
                field: "product name",
            });
        }
        check_len("product name", self.name, PRODUCT_NAME_MAX)?;
        check_len("product info", self.info, PRODUCT_INFO_MAX)?;
        check_len("manufacturer", self.manufacturer, MANUFACTURER_MAX)?;
        if self.price < 0 {
            return Err(CatalogError::Negative { field: "price" });
        }
        if self.stock < 0 {
            return Err(CatalogError::Negative { field: "stock" });
        }
        Ok(())
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), CatalogError> {
    if value.chars().count() > max {
        Err(CatalogError::TooLong { field, max })
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: i64, parent: Option<i64>, order: i64, main: Option<i64>) -> Category {
        Category {
            id: CategoryId::new(id),
            name: format!("c{id}"),
            parent_id: parent.map(CategoryId::new),
            display_order: order,
            main_display_order: main,
            image_url: None,
        }
    }

    fn sample() -> Vec<Category> {
        vec![
            category(1, None, 2, Some(3)),
            category(2, None, 1, None),
            category(3, Some(1), 2, Some(1)),
            category(4, Some(1), 1, None),
            category(5, Some(2), 1, Some(2)),
        ]
    }

    fn ids(categories: &[Category]) -> Vec<i64> {
        categories.iter().map(|c| c.id.as_i64()).collect()
    }

    #[test]
    fn test_parents_and_children_ordering() {
        let all = sample();
        assert_eq!(ids(&parents(&all)), vec![2, 1]);
        assert_eq!(ids(&children(&all, CategoryId::new(1))), vec![4, 3]);
    }

    #[test]
    fn test_tree() {
        let tree = tree(&sample());
        assert_eq!(tree.len(), 2);
        assert_eq!(ids(&tree[0].children), vec![5]);
    }

    #[test]
    fn test_main_display_orderings() {
        let all = sample();
        assert_eq!(ids(&main_display(&all)), vec![3, 5, 1]);
        assert_eq!(ids(&by_main_display_order(&all)), vec![3, 5, 1, 2, 4]);
    }

    #[test]
    fn test_leaves_exclude_parents() {
        assert_eq!(ids(&leaves(&sample())), vec![3, 4, 5]);
    }

    #[test]
    fn test_ensure_deletable() {
        let all = sample();
        assert_eq!(
            ensure_deletable(&all, CategoryId::new(1)),
            Err(CatalogError::HasChildren(CategoryId::new(1)))
        );
        assert!(ensure_deletable(&all, CategoryId::new(4)).is_ok());
    }

    #[test]
    fn test_banner_link() {
        let mut banner = Banner {
            id: BannerId::new(1),
            title: "Spring sale".to_string(),
            image_url: "/img/a.png".to_string(),
            target_url: Some("/categories/3".to_string()),
            display_order: 1,
        };
        assert_eq!(banner.link(), Some("/categories/3"));

        banner.target_url = Some("  ".to_string());
        assert_eq!(banner.link(), None);

        banner.title = COUPON_AD_TITLE.to_string();
        assert_eq!(banner.link(), Some(WELCOME_COUPONS_PATH));
    }

    #[test]
    fn test_display_order_rules() {
        assert!(validate_display_order("display order", 1).is_ok());
        assert!(validate_display_order("display order", 0).is_err());
        assert_eq!(parse_main_display_order("  ").unwrap(), None);
        assert_eq!(parse_main_display_order("4").unwrap(), Some(4));
        assert!(parse_main_display_order("0").is_err());
        assert!(parse_main_display_order("x").is_err());
    }

    #[test]
    fn test_product_text_limits() {
        let ok = ProductText {
            name: "Green tea",
            info: "Loose leaf",
            manufacturer: "Jeju Farms",
            price: 12_000,
            stock: 3,
        };
        assert!(ok.validate().is_ok());

        let long_name = "가".repeat(101);
        let too_long = ProductText {
            name: &long_name,
            ..ok
        };
        assert_eq!(
            too_long.validate(),
            Err(CatalogError::TooLong {
                field: "product name",
                max: 100
            })
        );

        let negative = ProductText { stock: -1, ..ok };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_category_wire_shape() {
        let category: Category = serde_json::from_str(
            r#"{"id":7,"name":"Tea","parentId":null,"displayOrder":2,"mainDisplayOrder":null}"#,
        )
        .unwrap();
        assert!(category.is_parent());
        assert_eq!(category.image_url, None);
    }
}
