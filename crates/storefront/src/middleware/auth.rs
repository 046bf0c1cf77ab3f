//! Admin authentication extractor.
//!
//! Admin order endpoints require `Authorization: Bearer <ADMIN_API_TOKEN>`.
//! Issuing that token is outside this service; it is read from configuration.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use secrecy::ExposeSecret;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires the admin bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_handler(_admin: RequireAdmin) -> impl IntoResponse {
///     "admin only"
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

        let expected = state.config().admin_api_token.expose_secret();
        if !constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
            tracing::warn!(path = %parts.uri.path(), "Rejected admin request with wrong token");
            return Err(AppError::Unauthorized("invalid token".to_owned()));
        }

        Ok(Self)
    }
}

/// Compare two byte strings without exiting early on the first difference.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
