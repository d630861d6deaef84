//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers
//! 2. `TraceLayer`
//! 3. Request ID
//! 4. Security headers
//! 5. Session layer (`admin.session` in `PostgreSQL`)
//! 6. [`RequireAdminAuth`] on every console route

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::RequireAdminAuth;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
