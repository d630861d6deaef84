//! Shopbag Core - Shared types and shopping rules.
//!
//! This crate provides the pieces shared by every Shopbag component:
//! - `backend` - REST client for the commerce backend
//! - `storefront` - Public-facing shop
//! - `admin` - Catalog administration console
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Cart bookkeeping, coupon reconciliation
//! and totals live here so both binaries and the tests share one definition.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, and validated form inputs
//! - [`cart`] - Local cart and the sync plan against the server copy
//! - [`checkout`] - Selection, coupons, shipping, and order drafts
//! - [`catalog`] - Category tree ordering, banners, and catalog field rules
//! - [`pagination`] - Page windows for list views

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod pagination;
pub mod types;

pub use types::*;
