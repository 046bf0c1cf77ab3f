//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded in the span, echoed in the response)
//! 4. Security headers
//! 5. Session layer (cart snapshot)
//! 6. Rate limiting on order submission routes (governor)
//!
//! Admin routes authenticate with the [`RequireAdmin`] extractor.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::RequireAdmin;
pub use rate_limit::checkout_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
