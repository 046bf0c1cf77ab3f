//! Rate limiting for order submission, using governor and `tower_governor`.
//!
//! Keys on the client IP taken from proxy headers. Requests with no proxy
//! header at all (local development, tests) share one bucket. Rejections are
//! answered with the JSON error body used by every other endpoint.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::http::{HeaderValue, Request, header};
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

/// Headers checked for the client IP, in order.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

/// Key extractor for deployments behind Cloudflare or a load balancer.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        let header_ip = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        };

        if let Some(ip) = header_ip(CLIENT_IP_HEADERS[0]) {
            return Ok(ip);
        }

        // X-Forwarded-For: first IP in the chain
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        Ok(CLIENT_IP_HEADERS[1..]
            .iter()
            .find_map(|name| header_ip(name))
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for order submission: ~20 orders per minute per IP.
///
/// Replenishes one token every 3 seconds, burst of 20.
///
/// # Panics
///
/// Never in practice: `per_second(3)` and `burst_size(20)` are both
/// non-zero, which is all `GovernorConfigBuilder::finish` checks.
#[must_use]
pub fn checkout_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(3)
        .burst_size(20)
        .finish()
        .expect("rate limiter config with per_second(3) and burst_size(20) is valid");
    GovernorLayer::new(Arc::new(config)).error_handler(rejection_response)
}

/// JSON 429 with `Retry-After` in seconds.
fn rejection_response(error: GovernorError) -> Response {
    match error {
        GovernorError::TooManyRequests { wait_time, .. } => {
            tracing::debug!(wait_time, "Rate limit exceeded");
            let mut response = AppError::RateLimited.into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(wait_time));
            response
        }
        other => AppError::Internal(format!("rate limiter failed: {other:?}")).into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn extract(headers: &[(&str, &str)]) -> IpAddr {
        let mut builder = Request::builder().uri("/orders");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        ClientIpKeyExtractor
            .extract(&builder.body(()).unwrap())
            .unwrap()
    }

    #[test]
    fn test_prefers_cloudflare_header() {
        let ip = extract(&[
            ("x-forwarded-for", "10.0.0.1"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_uses_first_forwarded_address() {
        let ip = extract(&[("x-forwarded-for", "198.51.100.2, 10.0.0.1")]);
        assert_eq!(ip, "198.51.100.2".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_rejection_is_json_with_retry_after() {
        let response = rejection_response(GovernorError::TooManyRequests {
            wait_time: 3,
            headers: None,
        });
        assert_eq!(response.status(), axum::http::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "3");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Rate limited");
    }

    #[test]
    fn test_falls_back_to_shared_bucket() {
        assert_eq!(extract(&[]), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(
            extract(&[("x-forwarded-for", "not-an-ip")]),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }
}
