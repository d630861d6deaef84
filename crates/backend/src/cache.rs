//! Cache types for catalog responses.
//!
//! Only slow-changing public lists are cached. Product details are never
//! cached because stock has to be current at checkout.

use std::sync::Arc;

use shopbag_core::catalog::{Banner, Category};

/// Cache key for catalog lists.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Banners,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Banners(Arc<Vec<Banner>>),
}
