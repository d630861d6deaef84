//! Visitor cart kept on the web tier, plus the plan that mirrors it to the
//! backend.
//!
//! Two lists exist per visitor: the local cart (what the visitor sees) and a
//! snapshot of what the backend is known to hold. Every mutation edits the
//! local cart; for logged-in visitors [`plan_sync`] turns the difference into
//! add/update/delete calls, and the snapshot is advanced as those calls succeed.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// One cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub const fn new(id: ProductId, quantity: u32) -> Self {
        Self { id, quantity }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("product {0} is already in the cart")]
    AlreadyInCart(ProductId),
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Ordered list of cart lines, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalCart {
    items: Vec<CartItem>,
}

impl LocalCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if !cart.contains(item.id) && item.quantity > 0 {
                cart.items.push(item);
            }
        }
        cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct products.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    #[must_use]
    pub fn quantity_of(&self, id: ProductId) -> Option<u32> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.quantity)
    }

    /// Add a product. A missing quantity means one.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInCart` when the product is present and
    /// `InvalidQuantity` for a zero quantity.
    pub fn add(&mut self, id: ProductId, quantity: Option<u32>) -> Result<(), CartError> {
        let quantity = quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if self.contains(id) {
            return Err(CartError::AlreadyInCart(id));
        }
        self.items.push(CartItem::new(id, quantity));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotInCart` for unknown products and `InvalidQuantity` for zero.
    pub fn update_quantity(&mut self, id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(CartError::NotInCart(id))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Remove a product. Returns whether anything was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn remove_many(&mut self, ids: &[ProductId]) {
        self.items.retain(|item| !ids.contains(&item.id));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Merge the backend's cart into this one after login.
    ///
    /// Server lines come first and keep the server quantity. Lines only
    /// present locally are kept after them.
    pub fn merge_server(&mut self, server: &[CartItem]) {
        let mut merged = Self::from_items(server.to_vec());
        for item in &self.items {
            if !merged.contains(item.id) {
                merged.items.push(*item);
            }
        }
        *self = merged;
    }
}

/// Calls needed to make the backend cart match the local cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSyncPlan {
    /// In the local cart but not on the backend.
    pub add: Vec<CartItem>,
    /// On both sides with a different quantity. Carries the local quantity.
    pub update: Vec<CartItem>,
    /// On the backend but no longer in the local cart.
    pub delete: Vec<ProductId>,
}

impl CartSyncPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// Diff the local cart against the last known backend snapshot.
#[must_use]
pub fn plan_sync(local: &LocalCart, snapshot: &LocalCart) -> CartSyncPlan {
    let mut plan = CartSyncPlan::default();
    for item in local.items() {
        match snapshot.quantity_of(item.id) {
            None => plan.add.push(*item),
            Some(quantity) if quantity != item.quantity => plan.update.push(*item),
            Some(_) => {}
        }
    }
    plan.delete = snapshot
        .items()
        .iter()
        .filter(|item| !local.contains(item.id))
        .map(|item| item.id)
        .collect();
    plan
}

/// Apply one confirmed backend call to the snapshot.
pub fn record_synced(snapshot: &mut LocalCart, step: SyncStep) {
    match step {
        SyncStep::Added(item) | SyncStep::Updated(item) => {
            if snapshot.update_quantity(item.id, item.quantity).is_err() {
                snapshot.items.push(item);
            }
        }
        SyncStep::Deleted(id) => {
            snapshot.remove(id);
        }
    }
}

/// Drop products that were just ordered from the cart and its snapshot.
///
/// The backend empties those lines itself when the order is placed, so the
/// snapshot must forget them too or the next sync would delete them again.
pub fn retain_unordered(local: &mut LocalCart, snapshot: &mut LocalCart, ordered: &[ProductId]) {
    local.remove_many(ordered);
    snapshot.remove_many(ordered);
}

/// A backend cart call that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Added(CartItem),
    Updated(CartItem),
    Deleted(ProductId),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pid(id: i64) -> ProductId {
        ProductId::new(id)
    }

    fn cart(items: &[(i64, u32)]) -> LocalCart {
        LocalCart::from_items(
            items
                .iter()
                .map(|&(id, q)| CartItem::new(pid(id), q))
                .collect(),
        )
    }

    #[test]
    fn test_add_defaults_quantity_to_one() {
        let mut c = LocalCart::new();
        c.add(pid(1), None).unwrap();
        assert_eq!(c.quantity_of(pid(1)), Some(1));
    }

    #[test]
    fn test_add_rejects_duplicate() {
        let mut c = cart(&[(1, 2)]);
        assert_eq!(c.add(pid(1), Some(3)), Err(CartError::AlreadyInCart(pid(1))));
        assert_eq!(c.quantity_of(pid(1)), Some(2));
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut c = LocalCart::new();
        assert_eq!(c.add(pid(1), Some(0)), Err(CartError::InvalidQuantity));
        assert!(c.is_empty());
    }

    #[test]
    fn test_update_and_remove() {
        let mut c = cart(&[(1, 1), (2, 1)]);
        c.update_quantity(pid(2), 5).unwrap();
        assert_eq!(c.quantity_of(pid(2)), Some(5));
        assert_eq!(
            c.update_quantity(pid(9), 1),
            Err(CartError::NotInCart(pid(9)))
        );
        assert!(c.remove(pid(1)));
        assert!(!c.remove(pid(1)));
        assert_eq!(c.count(), 1);
    }

    #[test]
    fn test_remove_many_and_clear() {
        let mut c = cart(&[(1, 1), (2, 1), (3, 1)]);
        c.remove_many(&[pid(1), pid(3)]);
        assert_eq!(c.items(), &[CartItem::new(pid(2), 1)]);
        c.clear();
        assert!(c.is_empty());
    }

    #[test]
    fn test_merge_server_prefers_server_quantity() {
        let mut c = cart(&[(1, 1), (2, 4)]);
        c.merge_server(&[CartItem::new(pid(2), 7), CartItem::new(pid(3), 1)]);
        assert_eq!(
            c.items(),
            &[
                CartItem::new(pid(2), 7),
                CartItem::new(pid(3), 1),
                CartItem::new(pid(1), 1),
            ]
        );
    }

    #[test]
    fn test_plan_sync() {
        let local = cart(&[(1, 1), (2, 3), (4, 1)]);
        let snapshot = cart(&[(2, 1), (3, 1), (4, 1)]);
        let plan = plan_sync(&local, &snapshot);
        assert_eq!(plan.add, vec![CartItem::new(pid(1), 1)]);
        assert_eq!(plan.update, vec![CartItem::new(pid(2), 3)]);
        assert_eq!(plan.delete, vec![pid(3)]);
    }

    #[test]
    fn test_plan_sync_identical_is_empty() {
        let local = cart(&[(1, 2)]);
        assert!(plan_sync(&local, &local.clone()).is_empty());
    }

    #[test]
    fn test_record_synced_converges() {
        let local = cart(&[(1, 1), (2, 3)]);
        let mut snapshot = cart(&[(2, 1), (3, 1)]);
        let plan = plan_sync(&local, &snapshot);
        for item in plan.add {
            record_synced(&mut snapshot, SyncStep::Added(item));
        }
        for item in plan.update {
            record_synced(&mut snapshot, SyncStep::Updated(item));
        }
        for id in plan.delete {
            record_synced(&mut snapshot, SyncStep::Deleted(id));
        }
        assert!(plan_sync(&local, &snapshot).is_empty());
    }

    #[test]
    fn test_retain_unordered_clears_both_sides() {
        let mut local = cart(&[(1, 1), (2, 2), (3, 1)]);
        let mut snapshot = cart(&[(1, 1), (2, 2)]);
        retain_unordered(&mut local, &mut snapshot, &[pid(1), pid(2)]);
        assert_eq!(local.items(), cart(&[(3, 1)]).items());
        assert!(snapshot.is_empty());
        assert!(plan_sync(&local, &snapshot).delete.is_empty());
    }
}
