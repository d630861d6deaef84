//! Data every storefront page renders in its header.

use shopbag_core::catalog::{CategoryNode, tree};

use crate::error::Result;
use crate::models::{CurrentUser, Flash};
use crate::services::visitor::Visitor;
use crate::state::AppState;

/// A top-level category with its dropdown entries.
#[derive(Debug, Clone)]
pub struct NavCategory {
    pub id: String,
    pub name: String,
    pub children: Vec<NavChild>,
}

#[derive(Debug, Clone)]
pub struct NavChild {
    pub id: String,
    pub name: String,
}

impl From<&CategoryNode> for NavCategory {
    fn from(node: &CategoryNode) -> Self {
        Self {
            id: node.category.id.to_string(),
            name: node.category.name.clone(),
            children: node
                .children
                .iter()
                .map(|child| NavChild {
                    id: child.id.to_string(),
                    name: child.name.clone(),
                })
                .collect(),
        }
    }
}

/// Header and flash data for the base layout.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub nav: Vec<NavCategory>,
    pub cart_count: usize,
    pub user: Option<CurrentUser>,
    pub admin_url: Option<String>,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Build the header for the current visitor and consume pending flashes.
    ///
    /// A failing category request degrades to an empty menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(state: &AppState, visitor: &Visitor) -> Result<Self> {
        let nav = match state.backend().categories().await {
            Ok(categories) => tree(&categories).iter().map(NavCategory::from).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load navigation categories");
                Vec::new()
            }
        };

        let user = visitor.current_user().await?;
        let admin_url = user
            .as_ref()
            .filter(|u| u.is_admin())
            .and(state.config().admin_url.clone());

        Ok(Self {
            nav,
            cart_count: visitor.cart().await?.count(),
            user,
            admin_url,
            flashes: visitor.take_flashes().await?,
        })
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}
