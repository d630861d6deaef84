//! Core types for Shopbag.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod password;
pub mod phone;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Won;
pub use password::{Password, PasswordError};
pub use phone::{DeliveryPhone, MOBILE_PREFIXES, PhoneError, SignupPhone};
pub use status::*;
