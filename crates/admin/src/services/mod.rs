//! Request-scoped services for the admin console.

pub mod console;
pub mod uploads;

pub use console::{AdminPage, AdminSession};
