//! Client for the Shopbag commerce backend REST API.
//!
//! The storefront and the admin console never talk to a database for
//! business data; products, carts, coupons, addresses and orders all live
//! behind this API. [`BackendClient`] wraps `reqwest`, attaches bearer tokens
//! from [`Credentials`], transparently refreshes an expired access token once
//! per failing call, and caches the public category and banner lists.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopbag_backend::{BackendClient, BackendConfig, Credentials};
//!
//! let client = BackendClient::new(&config)?;
//! let credentials = Credentials::new(session_tokens);
//! let cart = client.server_cart(&credentials).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod addresses;
pub mod admin;
pub mod auth;
pub mod cache;
mod carts;
mod catalog;
mod client;
mod coupons;
pub mod error;
mod orders;
pub mod types;

pub use admin::{BannerUpload, CategoryUpload, FilePart, ProductUpload};
pub use auth::{AccessClaims, AuthTokens, Credentials, SignupRequest};
pub use cache::CacheKey;
pub use client::{BackendClient, BackendConfig};
pub use error::BackendError;
