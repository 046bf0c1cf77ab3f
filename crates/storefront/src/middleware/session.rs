//! Session middleware configuration.
//!
//! Sessions carry the visitor's cart snapshot. Production uses the
//! `PostgreSQL` store from tower-sessions-sqlx-store; tests pass a
//! `MemoryStore`.

use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "atelier_session";

/// Session expiry time in seconds (30 days), matching a long-lived cart.
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer over `store`.
///
/// The cookie is marked `Secure` when `base_url` is HTTPS.
#[must_use]
pub fn create_session_layer<S>(store: S, base_url: &str) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    let is_secure = base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
